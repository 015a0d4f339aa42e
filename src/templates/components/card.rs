use crate::domain::{ListingRecord, RoomCount};
use crate::matching::response::format_price;
use maud::{html, Markup};

pub fn card(title: &str, body: Markup) -> Markup {
    html! {
        div class="card" {
            h2 { (title) }
            div class="card-body" {
                (body)
            }
        }
    }
}

/// "2 bd", "1-3 bd", "1.5 ba".
pub fn rooms_label<T: Copy + Into<f64>>(count: &RoomCount<T>, unit: &str) -> String {
    let (min, max) = count.bounds();
    if min == max {
        format!("{min} {unit}")
    } else {
        format!("{min}-{max} {unit}")
    }
}

pub fn listing_card(listing: &ListingRecord) -> Markup {
    card(
        &listing.title,
        html! {
            p class="price" { (format_price(listing.price)) " / month" }
            p {
                (rooms_label(&listing.bedrooms, "bd")) " · "
                (rooms_label(&listing.bathrooms, "ba")) " · "
                (listing.property_type)
            }
            p class="address" { (listing.address) }
            a href={ "/listings/" (listing.id) } { "View details" }
        },
    )
}

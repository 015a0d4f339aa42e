// templates/pages/listing.rs

use crate::domain::ListingRecord;
use crate::matching::response::format_price;
use crate::templates::{components::rooms_label, desktop_layout};
use maud::{html, Markup};

pub fn listing_page(listing: &ListingRecord) -> Markup {
    desktop_layout(
        &listing.title,
        html! {
            main class="container" {
                h1 { (listing.title) }
                p class="price" { (format_price(listing.price)) " / month" }
                p class="address" {
                    (listing.address)
                    @if let Some(loc) = &listing.location { " (" (loc) ")" }
                }

                section class="card" {
                    ul {
                        li { "Type: " (listing.property_type) }
                        li { "Bedrooms: " (rooms_label(&listing.bedrooms, "bd")) }
                        li { "Bathrooms: " (rooms_label(&listing.bathrooms, "ba")) }
                        @if let Some(sq) = listing.square_feet {
                            li { "Size: " (sq) " sq ft" }
                        }
                        @if let Some(date) = listing.available_date {
                            li { "Available: " (date.format("%B %-d, %Y")) }
                        }
                    }
                }

                p { (listing.description) }

                @if !listing.amenities.is_empty() {
                    section class="card" {
                        h3 { "Amenities" }
                        ul {
                            @for amenity in &listing.amenities {
                                li { (amenity) }
                            }
                        }
                    }
                }

                section class="card" {
                    h3 { "Contact" }
                    p { a href={ "mailto:" (listing.contact.email) } { (listing.contact.email) } }
                    @if let Some(phone) = &listing.contact.phone {
                        p { (phone) }
                    }
                }
            }
        },
    )
}

// templates/pages/home.rs

use crate::domain::ListingRecord;
use crate::templates::{components::listing_card, desktop_layout};
use maud::{html, Markup, PreEscaped};

const CHAT_SCRIPT: &str = r#"
document.getElementById('chat-form').addEventListener('submit', async (event) => {
  event.preventDefault();
  const input = document.getElementById('message');
  const reply = document.getElementById('reply');
  const results = document.getElementById('results');
  const message = input.value.trim();
  if (!message) return;

  reply.textContent = 'Searching...';
  results.innerHTML = '';
  try {
    const resp = await fetch('/chat/ask', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify({ message }),
    });
    const data = await resp.json();
    reply.textContent = data.message || data.error || '';
    for (const listing of data.listings || []) {
      const item = document.createElement('li');
      const link = document.createElement('a');
      link.href = '/listings/' + listing.id;
      link.textContent = listing.title + ' - $' + listing.price + ' - ' + listing.address;
      item.appendChild(link);
      results.appendChild(item);
    }
  } catch (err) {
    reply.textContent = "I'm sorry, something went wrong. Please try again.";
  }
});
"#;

pub fn home_page(recent: &[ListingRecord]) -> Markup {
    desktop_layout(
        "Search",
        html! {
            main class="container" {
                h1 { "Find your next place" }
                p { "Describe what you're looking for, e.g. "
                    em { "\"2 bedroom apartment under $1500 near Riverside with parking\"" } }

                form id="chat-form" {
                    textarea id="message" name="message" rows="2" placeholder="What are you looking for?" {}
                    button class="btn" type="submit" { "Search" }
                }

                section class="chat-reply" {
                    p id="reply" {}
                    ul id="results" {}
                }

                section {
                    h2 { "Recently listed" }
                    @if recent.is_empty() {
                        p { "No listings yet." }
                    }
                    @for listing in recent {
                        (listing_card(listing))
                    }
                }
            }
            script { (PreEscaped(CHAT_SCRIPT)) }
        },
    )
}

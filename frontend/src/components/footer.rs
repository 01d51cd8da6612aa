//! Footer component

use leptos::*;

#[component]
pub fn Footer() -> impl IntoView {
    view! {
        <footer>
            <div>"4TU.ResearchData FAIR Data Fund"</div>
            <div class="footer-links">
                <a href="https://data.4tu.nl/info/about-4tu-researchdata/fair-data-fund" class="footer-link" target="_blank">
                    "About the fund"
                </a>
                <a href="https://data.4tu.nl/info/contact-us" class="footer-link" target="_blank">
                    "Contact"
                </a>
            </div>
        </footer>
    }
}

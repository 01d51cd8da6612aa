//! Reviewer scoring form and dashboard.

use std::rc::Rc;

use leptos::*;
use leptos_router::*;

use super::Hero;
use crate::browser::{BrowserNavigator, DomForm};
use crate::config::{ReviewProfile, BACKEND_URL};
use crate::services::{BrowserTransport, FormClient, ReviewScores, SignalNotifier};

const SCORES: &[&str] = &["1", "2", "3", "4", "5"];

/// `?form=fair` selects the per-principle scores.
fn profile_from_query(query: &ParamsMap) -> ReviewProfile {
    match query.get("form").map(String::as_str) {
        Some("fair") => ReviewProfile::Fair,
        _ => ReviewProfile::Basic,
    }
}

#[component]
pub fn ReviewFormPage(notifier: SignalNotifier) -> impl IntoView {
    let params = use_params_map();
    let query = use_query_map();
    let application_id = params.with_untracked(|p| p.get("id").cloned().unwrap_or_default());
    let profile = query.with_untracked(profile_from_query);

    let client = Rc::new(FormClient::new(
        BrowserTransport,
        notifier,
        DomForm::new("review-form"),
        BrowserNavigator,
        BACKEND_URL,
    ));

    let on_submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        let client = client.clone();
        let application_id = application_id.clone();
        spawn_local(async move {
            let scores = ReviewScores::collect(&DomForm::new("review-form"), profile);
            let _ = client.submit_review(&application_id, &scores).await;
        });
    };

    view! {
        <Hero title="Review application"/>
        <form id="review-form" on:submit=on_submit>
            {profile
                .fields()
                .iter()
                .map(|&field| {
                    let id = format!("score-{}", field);
                    view! {
                        <label for=id.clone()>{field}</label>
                        <select id=id>
                            <option value="">"-"</option>
                            {SCORES
                                .iter()
                                .map(|&score| view! { <option value=score>{score}</option> })
                                .collect_view()}
                        </select>
                    }
                })
                .collect_view()}
            <button type="submit" id="submit-button">"Submit review"</button>
        </form>
    }
}

#[component]
pub fn ReviewDashboard() -> impl IntoView {
    view! {
        <Hero
            title="Review dashboard"
            subtitle="Your review has been stored. Pick the next application from the list you received."
        />
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_from_query() {
        let mut query = ParamsMap::new();
        assert_eq!(profile_from_query(&query), ReviewProfile::Basic);

        query.insert("form".to_string(), "fair".to_string());
        assert_eq!(profile_from_query(&query), ReviewProfile::Fair);

        query.insert("form".to_string(), "basic".to_string());
        assert_eq!(profile_from_query(&query), ReviewProfile::Basic);

        let mut legacy = ParamsMap::new();
        legacy.insert("variant".to_string(), "fair".to_string());
        assert_eq!(profile_from_query(&legacy), ReviewProfile::Basic);
    }
}

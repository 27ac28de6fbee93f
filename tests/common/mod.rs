//! Catalogue page fixtures and mock server helpers shared by the integration tests.

#![allow(dead_code)]

use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A catalogue page with one product entry per title, links relative to the page.
pub fn catalogue_page(titles: &[&str]) -> String {
    let entries: String = titles
        .iter()
        .map(|title| {
            let slug = title.to_lowercase().replace(' ', "-");
            format!(
                r#"<li class="col-xs-6"><article class="product_pod">
                    <p class="star-rating Three"><i class="icon-star"></i></p>
                    <h3><a href="{slug}/index.html" title="{title}">{title}</a></h3>
                    <div class="product_price">
                        <p class="price_color">£20.00</p>
                        <p class="instock availability"><i class="icon-ok"></i>
                            In stock
                        </p>
                    </div>
                </article></li>"#
            )
        })
        .collect();
    format!(r#"<!DOCTYPE html><html><body><section><ol class="row">{entries}</ol></section></body></html>"#)
}

/// Serves `body` at `route`, after `delay`.
pub async fn mount_page(server: &MockServer, route: &str, body: String, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

pub async fn mount_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Number of requests the server received for `route`.
pub async fn hits(server: &MockServer, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == route)
        .count()
}

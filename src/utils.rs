use reqwest::{Client, RequestBuilder, header::ACCEPT};

pub(crate) static APP_USER_AGENT: &str =
    concat!("RS", env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

const ATOM_ACCEPT: &str = "application/atom+xml, application/xml;q=0.9, text/xml;q=0.8";

pub(crate) fn build_request(client: &Client, url: &str) -> RequestBuilder {
    client.get(url).header(ACCEPT, ATOM_ACCEPT)
}

mod client;

pub use client::{
    Credentials, DavClient, DavError, DavErrorClass, collection_url, member_url,
};
pub use reqwest::StatusCode;
pub use url::Url;

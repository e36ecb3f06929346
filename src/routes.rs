pub mod ai;
pub mod auth;
pub mod error;
pub mod health;
pub mod question;
pub mod session;

use rocket::Route;
use std::fmt::Display;

/// Location of `resource/id` under the API base the handling route is mounted at.
pub(crate) fn resource_location(route: &Route, resource: &str, id: impl Display) -> String {
    let api_base = route.uri.base().rsplit_once('/').map_or("", |(api_base, _)| api_base);
    format!("{}/{}/{}", api_base, resource, id)
}

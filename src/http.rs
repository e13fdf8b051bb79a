// src/http.rs
use actix_web::HttpResponse;
use actix_web::cookie::Cookie;
use actix_web::http::header;

/// `303 See Other`, the answer to every successful form post.
pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

pub fn redirect_with_cookie(location: &str, cookie: Cookie<'static>) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .cookie(cookie)
        .finish()
}

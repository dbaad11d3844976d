use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::token::Claims;
use crate::error::AppError;

/// The authenticated identity: the user id derived from a verified session token.
///
/// This extractor is intended to be used on routes protected by `AuthMiddleware`,
/// which validates the JWT and inserts the decoded `Claims` into request
/// extensions. Every downstream ownership check keys off this id.
///
/// If no claims are present (e.g. the middleware was not applied), the
/// extractor rejects the request with 401.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub user_id: i32,
}

impl FromRequest for AuthenticatedUser {
    type Error = ActixError; // AppError converts into ActixError via ResponseError
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Claims>() {
            Some(claims) => ready(Ok(AuthenticatedUser {
                user_id: claims.sub,
            })),
            None => {
                let err = AppError::Unauthenticated(
                    "No authenticated identity. Ensure AuthMiddleware is active.".to_string(),
                );
                ready(Err(err.into()))
            }
        }
    }
}

use std::fmt::{Debug, Display};
use std::panic::Location;

use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Body, Response, StatusCode};
use routerify::RequestInfo;
use serde::Serialize;
use serde_json::json;

/// Builds a response with a JSON body. Serialization failures turn into a
/// plain 500 route error.
pub fn json_response<E, T: Serialize + ?Sized>(status: StatusCode, body: &T) -> Result<Response<Body>, RouteError<E>> {
    let body = serde_json::to_vec(body).map_err(|_| RouteError::from((StatusCode::INTERNAL_SERVER_ERROR, "failed to serialize response")))?;
    Ok(raw_json_response(status, body.into()))
}

pub fn empty_response(status: StatusCode) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}

fn raw_json_response(status: StatusCode, body: Body) -> Response<Body> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn message_response(status: StatusCode, message: &str) -> Response<Body> {
    raw_json_response(status, json!({ "success": false, "message": message }).to_string().into())
}

/// Turns the boxed error routerify hands us back into a response, logging it
/// according to its severity.
pub async fn error_handler<E: std::error::Error + Send + Sync + 'static>(
    err: routerify::RouteError,
    info: RequestInfo,
) -> Response<Body> {
    match err.downcast::<RouteError<E>>() {
        Ok(err) => {
            let location = err.location();

            err.span().in_scope(|| match err.should_log() {
                ShouldLog::Yes => {
                    tracing::error!(path = %info.uri(), method = %info.method(), location = %location, error = ?err, "http error")
                }
                ShouldLog::Debug => {
                    tracing::debug!(path = %info.uri(), method = %info.method(), location = %location, error = ?err, "http error")
                }
                ShouldLog::No => (),
            });

            err.response()
        }
        Err(err) => {
            tracing::error!(path = %info.uri(), method = %info.method(), error = ?err, "unhandled http error");
            message_response(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
        }
    }
}

/// An error response in the making: the status and message sent to the
/// client, plus the source error, span and call site kept for logging.
pub struct RouteError<E> {
    source: Option<E>,
    location: &'static Location<'static>,
    span: tracing::Span,
    status: StatusCode,
    message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShouldLog {
    Yes,
    Debug,
    No,
}

impl<E> RouteError<E> {
    pub fn span(&self) -> &tracing::Span {
        &self.span
    }

    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn response(&self) -> Response<Body> {
        message_response(self.status, &self.message)
    }

    pub fn should_log(&self) -> ShouldLog {
        if self.status.is_server_error() {
            ShouldLog::Yes
        } else if self.source.is_some() {
            ShouldLog::Debug
        } else {
            ShouldLog::No
        }
    }

    pub fn with_source(mut self, source: Option<E>) -> Self {
        self.source = source;
        self
    }

    pub fn with_location(mut self, location: &'static Location<'static>) -> Self {
        self.location = location;
        self
    }
}

impl<E, S: AsRef<str>> From<(StatusCode, S)> for RouteError<E> {
    #[track_caller]
    fn from((status, message): (StatusCode, S)) -> Self {
        Self {
            source: None,
            span: tracing::Span::current(),
            location: Location::caller(),
            status,
            message: message.as_ref().to_owned(),
        }
    }
}

impl<E, S: AsRef<str>, T> From<(StatusCode, S, T)> for RouteError<E>
where
    T: Into<E>,
{
    #[track_caller]
    fn from((status, message, source): (StatusCode, S, T)) -> Self {
        Self {
            source: Some(source.into()),
            span: tracing::Span::current(),
            location: Location::caller(),
            status,
            message: message.as_ref().to_owned(),
        }
    }
}

impl<E: Debug> Debug for RouteError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            Some(err) => write!(f, "RouteError({}): {:?}", self.status, err),
            None => write!(f, "RouteError({}): {}", self.status, self.message),
        }
    }
}

impl<E: Display> Display for RouteError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            Some(err) => write!(f, "{}: {}", self.message, err),
            None => write!(f, "{}", self.message),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RouteError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.source {
            Some(err) => Some(err),
            None => None,
        }
    }
}

pub mod ext {
    use std::panic::Location;
    use std::sync::{Arc, Weak};

    use hyper::StatusCode;

    use super::RouteError;

    pub trait ResultExt<T, E, E2>: Sized {
        fn map_err_route<C>(self, ctx: C) -> std::result::Result<T, RouteError<E2>>
        where
            RouteError<E2>: From<C>,
            E2: From<E>;

        fn map_ignore_err_route<C>(self, ctx: C) -> std::result::Result<T, RouteError<E2>>
        where
            RouteError<E2>: From<C>;
    }

    impl<T, E, E2> ResultExt<T, E, E2> for std::result::Result<T, E> {
        #[track_caller]
        fn map_err_route<C>(self, ctx: C) -> std::result::Result<T, RouteError<E2>>
        where
            RouteError<E2>: From<C>,
            E2: From<E>,
        {
            let location = Location::caller();
            self.map_err(|err| {
                RouteError::from(ctx)
                    .with_source(Some(err.into()))
                    .with_location(location)
            })
        }

        #[track_caller]
        fn map_ignore_err_route<C>(self, ctx: C) -> std::result::Result<T, RouteError<E2>>
        where
            RouteError<E2>: From<C>,
        {
            let location = Location::caller();
            self.map_err(|_| RouteError::from(ctx).with_location(location))
        }
    }

    pub trait OptionExt<T, E>: Sized {
        fn map_err_route<C>(self, ctx: C) -> std::result::Result<T, RouteError<E>>
        where
            RouteError<E>: From<C>;
    }

    impl<T, E> OptionExt<T, E> for std::option::Option<T> {
        #[track_caller]
        fn map_err_route<C>(self, ctx: C) -> std::result::Result<T, RouteError<E>>
        where
            RouteError<E>: From<C>,
        {
            let location = Location::caller();
            self.ok_or_else(|| RouteError::from(ctx).with_location(location))
        }
    }

    /// The router stores a `Weak` reference to the global state so open
    /// keep-alive connections do not hold it alive during shutdown.
    pub trait RequestGlobalExt<E> {
        fn get_global<G: Sync + Send + 'static>(&self) -> std::result::Result<Arc<G>, RouteError<E>>;
    }

    impl<E> RequestGlobalExt<E> for hyper::Request<hyper::Body> {
        #[track_caller]
        fn get_global<G: Sync + Send + 'static>(&self) -> std::result::Result<Arc<G>, RouteError<E>> {
            use routerify::ext::RequestExt;

            self.data::<Weak<G>>()
                .and_then(Weak::upgrade)
                .map_err_route((StatusCode::SERVICE_UNAVAILABLE, "server is shutting down"))
        }
    }
}

use std::fmt;

use serde::Deserialize;

use crate::error::ContextError;

/// Named backend request made against a surface.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BackendRequest {
    /// The platform's modern native API.
    Primary,
    /// The GL-family fallback.
    Legacy,
}

impl fmt::Display for BackendRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackendRequest::Primary => "primary",
            BackendRequest::Legacy => "legacy",
        })
    }
}

/// Which backend requests to attempt, in order.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendPreference {
    /// Primary, then legacy.
    #[default]
    Auto,
    Primary,
    Legacy,
}

impl BackendPreference {
    pub fn requests(self) -> &'static [BackendRequest] {
        match self {
            BackendPreference::Auto => &[BackendRequest::Primary, BackendRequest::Legacy],
            BackendPreference::Primary => &[BackendRequest::Primary],
            BackendPreference::Legacy => &[BackendRequest::Legacy],
        }
    }
}

/// Something a drawing context can be bound to.
pub trait Surface {
    type Context;

    /// Attempts to create a context using the named backend.
    fn request_context(&self, request: BackendRequest) -> Result<Self::Context, ContextError>;

    /// Current backing-buffer size in physical pixels.
    fn drawing_buffer_size(&self) -> (u32, u32);
}

/// Obtains a context for `surface`, trying the primary backend first and the
/// legacy backend second.
pub fn acquire_context<S: Surface>(surface: &S) -> Result<S::Context, ContextError> {
    acquire_context_with(surface, BackendPreference::Auto)
}

/// Like [`acquire_context`] with an explicit request order.
///
/// If every attempt reports [`ContextError::Unavailable`] the result is
/// [`ContextError::NoBackendAvailable`]; any other failure is returned as-is.
pub fn acquire_context_with<S: Surface>(
    surface: &S,
    preference: BackendPreference,
) -> Result<S::Context, ContextError> {
    let requests = preference.requests();
    let mut hard_failure = None;

    for &request in requests {
        match surface.request_context(request) {
            Ok(ctx) => {
                log::info!("acquired {request} graphics context");
                return Ok(ctx);
            }
            Err(ContextError::Unavailable { reason, .. }) => {
                log::debug!("{request} context unavailable: {reason}");
            }
            Err(e) => {
                log::warn!("{request} context request failed: {e}");
                hard_failure.get_or_insert(e);
            }
        }
    }

    Err(hard_failure.unwrap_or_else(|| ContextError::NoBackendAvailable {
        attempts: requests.to_vec(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HeadlessSurface;

    #[test]
    fn primary_wins_when_available() {
        let surface = HeadlessSurface::new(640, 480);
        let ctx = acquire_context(&surface).unwrap();
        assert_eq!(ctx.backend(), BackendRequest::Primary);
        assert_eq!(surface.requests(), vec![BackendRequest::Primary]);
    }

    #[test]
    fn falls_back_to_legacy_request() {
        let surface = HeadlessSurface::new(640, 480).without(BackendRequest::Primary);
        let ctx = acquire_context(&surface).unwrap();

        let direct = surface.request_context(BackendRequest::Legacy).unwrap();
        assert_eq!(ctx.backend(), direct.backend());
        assert_eq!(ctx.drawing_buffer_size(), direct.drawing_buffer_size());
        assert_eq!(ctx.current_viewport(), direct.current_viewport());
        assert_eq!(
            surface.requests(),
            vec![BackendRequest::Primary, BackendRequest::Legacy, BackendRequest::Legacy]
        );
    }

    #[test]
    fn no_backend_when_both_rejected() {
        let surface = HeadlessSurface::new(640, 480)
            .without(BackendRequest::Primary)
            .without(BackendRequest::Legacy);

        match acquire_context(&surface) {
            Err(ContextError::NoBackendAvailable { attempts }) => {
                assert_eq!(attempts, vec![BackendRequest::Primary, BackendRequest::Legacy]);
            }
            other => panic!("unexpected result: {:?}", other.map(|c| c.backend())),
        }
    }

    #[test]
    fn other_failures_are_reported_as_themselves() {
        let surface = HeadlessSurface::new(0, 0);
        assert!(matches!(acquire_context(&surface), Err(ContextError::ZeroSizedSurface)));
    }

    #[test]
    fn preference_limits_requests() {
        let surface = HeadlessSurface::new(64, 64);
        let ctx = acquire_context_with(&surface, BackendPreference::Legacy).unwrap();
        assert_eq!(ctx.backend(), BackendRequest::Legacy);
        assert_eq!(surface.requests(), vec![BackendRequest::Legacy]);
    }
}

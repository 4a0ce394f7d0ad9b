//! Backend paths used by the session layer and the rule deciding which calls
//! belong to the auth flow. A 401 from an auth-flow call must never start a
//! refresh, otherwise a dead refresh cookie would loop forever.

pub const VERIFY_PATH: &str = "/auth/verify?device=web";
pub const ADMIN_VERIFY_PATH: &str = "/admin/auth/verify";
pub const REFRESH_PATH: &str = "/admin/auth/refresh-cookie";

const AUTH_FLOW_PREFIXES: [&str; 2] = ["/auth/verify", "/auth/refresh"];

/// True when `path` is a verify, refresh or OTP endpoint.
#[must_use]
pub fn is_auth_flow(path: &str) -> bool {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let lowered = path.to_ascii_lowercase();
    AUTH_FLOW_PREFIXES
        .iter()
        .any(|marker| lowered.contains(marker))
        || lowered.split('/').any(is_otp_segment)
}

// `otp`, `verify-otp`, `otp-resend`; not words that merely contain the letters
fn is_otp_segment(segment: &str) -> bool {
    segment == "otp"
        || segment.ends_with("-otp")
        || segment.ends_with("_otp")
        || segment.starts_with("otp-")
        || segment.starts_with("otp_")
}

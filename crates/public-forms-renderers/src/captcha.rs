//! CAPTCHA requirement policy.

use public_forms_core::settings::primary_subtag;
use public_forms_core::PublicFormsSettings;
use public_forms_http::HttpRequest;

use crate::page::ContentBlock;

/// Session key set by the CAPTCHA verifier once a challenge was solved.
pub const CAPTCHA_PASSED_KEY: &str = "captcha_passed";

/// Decides whether `block` must show a CAPTCHA for `request`.
///
/// Authenticated users never see one. Otherwise `enable_captcha_always`
/// forces it, and `enable_captcha_once` asks until the session records a
/// solved challenge. The session is only read here.
pub fn is_required(request: &HttpRequest, block: &ContentBlock) -> bool {
    if request.user().is_authenticated() {
        return false;
    }
    if block.enable_captcha_always {
        return true;
    }
    if block.enable_captcha_once {
        return !request.session().get_flag(CAPTCHA_PASSED_KEY);
    }
    false
}

/// Picks the challenge language: the first `Accept-Language` entry whose
/// primary subtag is in `settings.languages`, else the primary subtag of
/// `settings.language_code`.
pub fn choose_language(request: &HttpRequest, settings: &PublicFormsSettings) -> String {
    request
        .accept_languages()
        .iter()
        .map(String::as_str)
        .map(primary_subtag)
        .find(|lang| settings.languages.iter().any(|l| l.eq_ignore_ascii_case(lang)))
        .unwrap_or_else(|| settings.fallback_language())
}

#[cfg(test)]
mod tests {
    use public_forms_http::{RequestUser, SessionData};

    use super::*;
    use crate::page::TargetRef;

    fn block(once: bool, always: bool) -> ContentBlock {
        ContentBlock::new("main", 0, "CreatePublicForm", TargetRef::new("blog.entry", None))
            .captcha_once(once)
            .captcha_always(always)
    }

    fn request(authenticated: bool, passed: bool) -> HttpRequest {
        let mut session = SessionData::new("s");
        if passed {
            session.set(CAPTCHA_PASSED_KEY, serde_json::Value::Bool(true));
        }
        let user = if authenticated {
            RequestUser::authenticated(1, "ada")
        } else {
            RequestUser::Anonymous
        };
        HttpRequest::builder().session(session).user(user).build()
    }

    #[test]
    fn test_truth_table() {
        for authenticated in [false, true] {
            for once in [false, true] {
                for always in [false, true] {
                    for passed in [false, true] {
                        let expected = !authenticated && (always || (once && !passed));
                        assert_eq!(
                            is_required(&request(authenticated, passed), &block(once, always)),
                            expected,
                            "auth={authenticated} once={once} always={always} passed={passed}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_non_boolean_flag_is_not_passed() {
        let mut session = SessionData::new("s");
        session.set(CAPTCHA_PASSED_KEY, serde_json::json!("yes"));
        let request = HttpRequest::builder().session(session).build();
        assert!(is_required(&request, &block(true, false)));
    }

    #[test]
    fn test_language_from_accept_header() {
        let settings = PublicFormsSettings::default();
        let request = HttpRequest::builder()
            .header("accept-language", "ja;q=0.9, de-AT, fr;q=0.5")
            .build();
        assert_eq!(choose_language(&request, &settings), "de");
    }

    #[test]
    fn test_language_fallback() {
        let settings = PublicFormsSettings {
            language_code: "pt-br".to_string(),
            ..PublicFormsSettings::default()
        };
        let request = HttpRequest::builder().header("accept-language", "ja").build();
        assert_eq!(choose_language(&request, &settings), "pt");
        let request = HttpRequest::builder().build();
        assert_eq!(choose_language(&request, &settings), "pt");
    }
}

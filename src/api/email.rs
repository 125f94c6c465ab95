//! Outbound email capability.
//!
//! Verification mail is a best-effort side effect: the stored challenge is
//! committed before delivery is attempted, and a failed send never rolls the
//! challenge back. Callers recover through `POST /verify/request`, which
//! issues a fresh code once the cooldown elapses.
//!
//! The default sender for local dev is `LogEmailSender`, which logs the
//! message and returns `Ok(())`. Production deployments implement
//! `EmailSender` against their SMTP relay or delivery API.

use anyhow::Result;
use tracing::info;

/// Email delivery abstraction.
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error.
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails; callers treat this as best-effort.
    fn send(&self, to: &str, subject: &str, text: &str, html: &str) -> Result<()>;
}

/// Local dev sender that logs the payload instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

impl EmailSender for LogEmailSender {
    fn send(&self, to: &str, subject: &str, text: &str, _html: &str) -> Result<()> {
        info!(to_email = %to, subject = %subject, body = %text, "email send stub");
        Ok(())
    }
}

const VERIFICATION_SUBJECT: &str = "Lubook Verification";

const VERIFICATION_TEXT: &str = r"
Hello, fellow artist or art enjoyer %%username%%!

This is an email for verification, requested by you for logging in to https://lubook.club. When logging in, you will be asked of this 6-digit code:

%%code%%

You can also copy and paste this link %%link%% to verify instead.

Best regards, Luna.
";

const VERIFICATION_HTML: &str = r#"
<h1>Hello, there!</h1>

<p>
  Dear fellow artist, art enjoyer or tourist alike,
  <strong>@%%username%%</strong>
  .
</p>

<p>
  This is an email, requested by you (<em>maybe?</em>) for verification to join
  the <a href="https://lubook.club">Lubook</a> community. You received this
  email because you registered <strong>%%email%%</strong> as your email address.
  Anyway, if you try logging in, you will be requested to input a 6-digit code:
</p>

<h3>%%code%%</h3>

<p style="font-size: 0.875rem">
  Psst, you can also just click this <a href="%%link%%">link</a> to verify
  instead, whatever works for you!
</p>

<p>
  The verification code will expire <strong>15 minutes</strong> from when this
  email is sent. So hurry up!
</p>
"#;

fn fill_placeholders(template: &str, username: &str, email: &str, code: &str, link: &str) -> String {
    template
        .replace("%%username%%", username)
        .replace("%%email%%", email)
        .replace("%%code%%", code)
        .replace("%%link%%", link)
        .trim()
        .to_string()
}

/// Build the verification email for an account.
///
/// Returns `(subject, text_body, html_body)` with the plaintext code and the
/// verification link filled in.
pub(crate) fn verification_email(
    username: &str,
    email: &str,
    code: &str,
    link: &str,
) -> (String, String, String) {
    (
        VERIFICATION_SUBJECT.to_string(),
        fill_placeholders(VERIFICATION_TEXT, username, email, code, link),
        fill_placeholders(VERIFICATION_HTML, username, email, code, link),
    )
}

//! Email service module for handling email-related functionality.
//!
//! This module provides functionality for sending verification emails over
//! SMTP, configured for Gmail. It uses the `lettre` crate for email handling
//! and supports both plain text and HTML email formats.
//!
//! # Environment Variables Required
//! - `SMTP_USERNAME`: Gmail address to send emails from
//! - `SMTP_PASSWORD`: Gmail app password for authentication
//! - `EMAIL_FROM_NAME`: Display name for the sender

use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{
    AsyncTransport, Tokio1Executor,
    message::{Message, MultiPart, SinglePart, header},
    transport::smtp::{AsyncSmtpTransport, authentication::Credentials},
};
use once_cell::sync::Lazy;

use common::config;

/// Global SMTP client instance configured for Gmail.
///
/// Initialized lazily on first use from the application config. The client
/// requires TLS and authentication.
static SMTP_CLIENT: Lazy<AsyncSmtpTransport<Tokio1Executor>> = Lazy::new(|| {
    let username = config::smtp_username();
    let password = config::smtp_password();

    let tls_parameters =
        TlsParameters::new("smtp.gmail.com".to_string()).expect("Failed to create TLS parameters");

    AsyncSmtpTransport::<Tokio1Executor>::relay("smtp.gmail.com")
        .expect("Failed to create SMTP transport")
        .port(587)
        .tls(Tls::Required(tls_parameters))
        .credentials(Credentials::new(username, password))
        .build()
});

/// Service for handling email-related operations.
pub struct EmailService;

impl EmailService {
    /// Sends the email-verification code to a freshly signed-up kid.
    ///
    /// # Arguments
    /// * `to_email` - The recipient's email address
    /// * `name` - The kid's display name used in the greeting
    /// * `code` - The 6-digit verification code
    ///
    /// The email carries both a plain text and an HTML version and mentions
    /// the configured expiry window.
    pub async fn send_verification_email(
        to_email: &str,
        name: &str,
        code: &str,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let from_email = config::smtp_username();
        let from_name = config::email_from_name();
        let expiry_minutes = config::otp_expiry_minutes();

        let email = Message::builder()
            .from(format!("{} <{}>", from_name, from_email).parse()?)
            .to(to_email.parse()?)
            .subject("Verify Your Email")
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(format!(
                                "Hello {},\n\n\
                                Welcome! Use the code below to verify your email address:\n\n\
                                {}\n\n\
                                This code will expire in {} minutes.\n\n\
                                If you did not sign up, please ignore this email.\n\n\
                                Best regards,\n\
                                {}",
                                name, code, expiry_minutes, from_name
                            )),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(format!(
                                r#"<!DOCTYPE html>
                                <html>
                                <head>
                                    <style>
                                        body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
                                        .container {{ max-width: 600px; margin: 0 auto; padding: 20px; text-align: center; }}
                                        .code {{
                                            display: inline-block;
                                            padding: 12px 24px;
                                            background-color: #f4f4f4;
                                            border-radius: 5px;
                                            margin: 20px 0;
                                            font-size: 28px;
                                            font-weight: bold;
                                            letter-spacing: 6px;
                                        }}
                                        .muted {{ color: #6c757d; font-size: 13px; }}
                                    </style>
                                </head>
                                <body>
                                    <div class="container">
                                        <h2>Verify Your Email</h2>
                                        <p>Hello {},</p>
                                        <p>Welcome! Use the code below to verify your email address:</p>
                                        <div class="code">{}</div>
                                        <p>This code will expire in {} minutes.</p>
                                        <p class="muted">If you did not sign up, please ignore this email.</p>
                                        <p>Best regards,<br>{}</p>
                                    </div>
                                </body>
                                </html>"#,
                                name, code, expiry_minutes, from_name
                            )),
                    ),
            )?;

        SMTP_CLIENT.send(email).await?;
        Ok(())
    }
}

/// Generates a random 6-digit verification code.
pub fn generate_verification_code() -> String {
    use rand::Rng;
    let code: u32 = rand::thread_rng().gen_range(100_000..1_000_000);
    code.to_string()
}

#[cfg(test)]
mod tests {
    use super::generate_verification_code;

    #[test]
    fn verification_code_is_six_digits() {
        for _ in 0..100 {
            let code = generate_verification_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }
}

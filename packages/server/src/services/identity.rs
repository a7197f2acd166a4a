use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::Rng;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, sea_query::Expr};
use sha2::{Digest, Sha256};
use tracing::info;

use common::{MailAttachment, MailMessage, Mailer, QrEncoder};

use crate::entity::user;
use crate::error::AppError;
use crate::models::identity::IdentityTokenResponse;

const SECRET_BYTES: usize = 32;

/// Build the opaque QR payload for a user.
///
/// Deterministic in its inputs. The secret only contributes through a
/// SHA-256 digest and never appears in the output.
pub fn encode_payload(user_id: i32, email: &str, secret: &str) -> String {
    let digest = Sha256::digest(format!("{user_id}:{email}:{secret}").as_bytes());
    format!(
        "evreg://u?id={user_id}&e={}&k={}",
        hex::encode(email.as_bytes()),
        hex::encode(digest)
    )
}

/// Inline a PNG as a `data:` URL for direct use in an `<img src>`.
pub fn png_data_url(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", BASE64.encode(png))
}

fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}

/// Per-user identity secrets and the QR tokens derived from them.
pub struct IdentityTokens<'a> {
    db: &'a DatabaseConnection,
    qr: &'a dyn QrEncoder,
    mailer: &'a dyn Mailer,
    site_name: &'a str,
}

impl<'a> IdentityTokens<'a> {
    pub fn new(
        db: &'a DatabaseConnection,
        qr: &'a dyn QrEncoder,
        mailer: &'a dyn Mailer,
        site_name: &'a str,
    ) -> Self {
        Self {
            db,
            qr,
            mailer,
            site_name,
        }
    }

    async fn find_user(&self, user_id: i32) -> Result<user::Model, AppError> {
        user::Entity::find_by_id(user_id)
            .one(self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    /// Return the user's secret, generating it on first use.
    ///
    /// The first write wins: the update only applies while the column is
    /// still NULL, and a losing caller re-reads the winner's secret.
    pub async fn get_or_create_secret(&self, user_id: i32) -> Result<String, AppError> {
        let existing = self.find_user(user_id).await?;
        if let Some(secret) = existing.identity_secret {
            return Ok(secret);
        }

        let secret = generate_secret();
        let res = user::Entity::update_many()
            .col_expr(user::Column::IdentitySecret, Expr::value(secret.clone()))
            .filter(user::Column::Id.eq(user_id))
            .filter(user::Column::IdentitySecret.is_null())
            .exec(self.db)
            .await?;
        if res.rows_affected == 1 {
            info!(user_id, "Identity secret initialized");
            return Ok(secret);
        }

        self.find_user(user_id)
            .await?
            .identity_secret
            .ok_or_else(|| AppError::Internal("identity secret vanished after init".into()))
    }

    /// Replace the secret unconditionally. Earlier payloads stop matching at once.
    pub async fn rotate(&self, user_id: i32) -> Result<String, AppError> {
        let secret = generate_secret();
        let res = user::Entity::update_many()
            .col_expr(user::Column::IdentitySecret, Expr::value(secret.clone()))
            .filter(user::Column::Id.eq(user_id))
            .exec(self.db)
            .await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound("User not found".into()));
        }
        info!(user_id, "Identity secret rotated");
        Ok(secret)
    }

    fn render(&self, u: user::Model, secret: &str) -> Result<IdentityTokenResponse, AppError> {
        let payload = encode_payload(u.id, &u.email, secret);
        let svg = self.qr.encode_svg(&payload)?;
        let data_url = png_data_url(&self.qr.encode_png(&payload)?);
        Ok(IdentityTokenResponse {
            user_id: u.id,
            name: u.name,
            email: u.email,
            payload,
            svg,
            data_url,
        })
    }

    /// The user's current token, initializing the secret if needed.
    pub async fn token_for(&self, user_id: i32) -> Result<IdentityTokenResponse, AppError> {
        let secret = self.get_or_create_secret(user_id).await?;
        let u = self.find_user(user_id).await?;
        self.render(u, &secret)
    }

    /// Rotate and return the new token.
    pub async fn rotate_token(&self, user_id: i32) -> Result<IdentityTokenResponse, AppError> {
        let secret = self.rotate(user_id).await?;
        let u = self.find_user(user_id).await?;
        self.render(u, &secret)
    }

    /// Email a token to its owner with the QR code attached.
    ///
    /// Runs after the state change it reports on and never undoes it.
    pub async fn deliver(&self, token: &IdentityTokenResponse) -> Result<(), AppError> {
        let png = self.qr.encode_png(&token.payload)?;
        let message = MailMessage {
            to: token.email.clone(),
            subject: format!("{}: your identity QR code", self.site_name),
            body: format!(
                "Hello {},\n\nAttached is your personal QR code for {}. Show it at check-in.\nIf you did not request this code, rotate it from your profile.\n",
                token.name, self.site_name
            ),
            attachments: vec![MailAttachment {
                filename: "identity-qr.png".into(),
                content_type: "image/png".into(),
                content: png,
            }],
        };

        self.mailer.send(message).await?;
        info!(user_id = token.user_id, "Identity token emailed");
        Ok(())
    }
}

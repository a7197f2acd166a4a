use serde_json::json;

use crate::common::{TestApp, routes};

mod registration {
    use super::*;

    #[tokio::test]
    async fn new_visitor_can_register_with_valid_details() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"name": "Alice Moreau", "email": "alice@example.com", "password": "securepass"}),
            )
            .await;

        assert_eq!(res.status, 201);
        assert!(res.body["id"].is_number());
        assert_eq!(res.body["name"], "Alice Moreau");
        assert_eq!(res.body["email"], "alice@example.com");
    }

    #[tokio::test]
    async fn email_is_stored_lowercased_and_duplicates_are_rejected_case_insensitively() {
        let app = TestApp::spawn().await;

        let first = app
            .post_without_token(
                routes::REGISTER,
                &json!({"name": "Alice", "email": "Alice@Example.com", "password": "securepass"}),
            )
            .await;
        assert_eq!(first.status, 201, "First registration failed: {}", first.text);
        assert_eq!(first.body["email"], "alice@example.com");

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"name": "Other Alice", "email": "ALICE@example.com", "password": "securepass"}),
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.code(), "EMAIL_TAKEN");
    }

    #[tokio::test]
    async fn cannot_register_with_a_short_password() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"name": "Alice", "email": "alice@example.com", "password": "short"}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn cannot_register_with_a_malformed_email() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"name": "Alice", "email": "not-an-email", "password": "securepass"}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn login_returns_token_with_visitor_permissions() {
        let app = TestApp::spawn().await;
        app.create_visitor("Bob").await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "bob@example.com", "password": "password123"}),
            )
            .await;

        assert_eq!(res.status, 200);
        assert!(res.body["token"].as_str().is_some_and(|t| !t.is_empty()));
        assert_eq!(res.body["role"], "visitor");
        let permissions = res.body["permissions"].as_array().unwrap();
        assert!(permissions.iter().any(|p| p == "enrollment:self"));
        assert!(!permissions.iter().any(|p| p == "activity:create"));
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = TestApp::spawn().await;
        app.create_visitor("Bob").await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "bob@example.com", "password": "wrongpassword"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.code(), "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn unknown_email_is_rejected_with_the_same_error() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "nobody@example.com", "password": "password123"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.code(), "INVALID_CREDENTIALS");
    }
}

mod me {
    use super::*;

    #[tokio::test]
    async fn me_returns_the_token_holder() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("Carol").await;

        let res = app.get_with_token(routes::ME, &admin.token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["id"], admin.id);
        assert_eq!(res.body["email"], "carol@example.com");
        assert_eq!(res.body["role"], "admin");
    }

    #[tokio::test]
    async fn me_without_token_is_unauthorized() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ME).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.code(), "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn me_with_garbage_token_is_unauthorized() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::ME, "not.a.jwt").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.code(), "TOKEN_INVALID");
    }
}

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use registrar::entity::enrollment;

use crate::common::{TestApp, routes};

mod issuance {
    use super::*;

    #[tokio::test]
    async fn certificate_requires_attendance_then_verifies() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("Admin").await;
        let alice = app.create_visitor("Alice Moreau").await;
        let id = app
            .create_activity("workshops", &admin.token, "Bookbinding", 3)
            .await;
        app.enroll("workshops", id, &alice.token).await;

        let res = app
            .get_with_token(&routes::certificate("workshops", id), &alice.token)
            .await;
        assert_eq!(res.status, 403);
        assert_eq!(res.code(), "NOT_ELIGIBLE");

        app.mark_attended("workshops", id, alice.id, &admin.token).await;

        let res = app
            .get_with_token(&routes::certificate("workshops", id), &alice.token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["subject_name"], "Alice Moreau");
        assert_eq!(res.body["activity_title"], "Bookbinding");
        assert_eq!(res.body["kind"], "workshop");
        let code = res.body["verification_code"].as_str().unwrap().to_string();
        assert_eq!(
            res.body["verify_url"],
            format!("https://events.test/api/v1/certificates/verify/{code}")
        );
        assert!(res.body["issued_at"].is_string());

        let again = app
            .get_with_token(&routes::certificate("workshops", id), &alice.token)
            .await;
        assert_eq!(again.body["verification_code"], code.as_str());
        assert_eq!(again.body["issued_at"], res.body["issued_at"]);

        let verified = app.get_without_token(&routes::verify(&code)).await;
        assert_eq!(verified.status, 200, "{}", verified.text);
        assert_eq!(verified.body["kind"], "workshop");
        assert_eq!(verified.body["participant_name"], "Alice Moreau");
        assert_eq!(verified.body["activity_title"], "Bookbinding");
    }

    #[tokio::test]
    async fn first_issuance_reports_the_stored_timestamp() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("Admin").await;
        let alice = app.create_visitor("Alice").await;
        let id = app
            .create_activity("workshops", &admin.token, "Bookbinding", 3)
            .await;
        app.enroll("workshops", id, &alice.token).await;
        app.mark_attended("workshops", id, alice.id, &admin.token).await;

        let res = app
            .get_with_token(&routes::certificate("workshops", id), &alice.token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        let reported = DateTime::parse_from_rfc3339(res.body["issued_at"].as_str().unwrap())
            .unwrap()
            .with_timezone(&Utc);

        let stored = enrollment::Entity::find()
            .filter(enrollment::Column::ActivityId.eq(id))
            .filter(enrollment::Column::UserId.eq(alice.id))
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.certificate_issued_at, Some(reported));
    }

    #[tokio::test]
    async fn caller_who_is_not_enrolled_gets_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("Admin").await;
        let alice = app.create_visitor("Alice").await;
        let id = app
            .create_activity("competitions", &admin.token, "Robot Sumo", 0)
            .await;

        let res = app
            .get_with_token(&routes::certificate("competitions", id), &alice.token)
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn concurrent_requests_store_a_single_code() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("Admin").await;
        let alice = app.create_visitor("Alice").await;
        let id = app
            .create_activity("competitions", &admin.token, "Robot Sumo", 0)
            .await;
        app.enroll("competitions", id, &alice.token).await;
        app.mark_attended("competitions", id, alice.id, &admin.token)
            .await;

        let path = routes::certificate("competitions", id);
        let requests = (0..8).map(|_| app.get_with_token(&path, &alice.token));
        let results = futures::future::join_all(requests).await;

        let codes: Vec<&str> = results
            .iter()
            .map(|r| {
                assert_eq!(r.status, 200, "{}", r.text);
                r.body["verification_code"].as_str().unwrap()
            })
            .collect();
        assert!(codes.iter().all(|c| *c == codes[0]));

        let stored = enrollment::Entity::find()
            .filter(enrollment::Column::ActivityId.eq(id))
            .filter(enrollment::Column::UserId.eq(alice.id))
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            stored.certificate_code.map(|c| c.to_string()).as_deref(),
            Some(codes[0])
        );
    }

    #[tokio::test]
    async fn document_download_contains_the_verification_code() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("Admin").await;
        let alice = app.create_visitor("Alice").await;
        let id = app
            .create_activity("workshops", &admin.token, "Bookbinding", 3)
            .await;
        app.enroll("workshops", id, &alice.token).await;
        app.mark_attended("workshops", id, alice.id, &admin.token).await;

        let res = app
            .get_with_token(&routes::certificate_document("workshops", id), &alice.token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let content_type = res.headers["content-type"].to_str().unwrap();
        assert!(content_type.starts_with("text/plain"));
        let disposition = res.headers["content-disposition"].to_str().unwrap();
        assert!(disposition.contains(&format!("certificate-workshop-{id}.txt")));
        assert!(res.text.contains("Test Congress"));
        assert!(res.text.contains("ALICE"));

        let payload = app
            .get_with_token(&routes::certificate("workshops", id), &alice.token)
            .await;
        let code = payload.body["verification_code"].as_str().unwrap();
        assert!(res.text.contains(code));
    }
}

mod verification {
    use super::*;

    #[tokio::test]
    async fn unknown_code_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .get_without_token(&routes::verify("6f1c2d7e-0000-4000-8000-000000000000"))
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn malformed_code_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(&routes::verify("not-a-code")).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn competition_certificate_verifies_with_its_kind() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("Admin").await;
        let bob = app.create_visitor("Bob").await;
        let id = app
            .create_activity("competitions", &admin.token, "Robot Sumo", 0)
            .await;
        app.enroll("competitions", id, &bob.token).await;
        app.mark_attended("competitions", id, bob.id, &admin.token).await;

        let cert = app
            .get_with_token(&routes::certificate("competitions", id), &bob.token)
            .await;
        let code = cert.body["verification_code"].as_str().unwrap();

        let res = app.get_without_token(&routes::verify(code)).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["kind"], "competition");
        assert_eq!(res.body["activity_title"], "Robot Sumo");
    }
}

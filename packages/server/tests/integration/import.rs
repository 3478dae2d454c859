use reqwest::multipart::{Form, Part};
use uuid::Uuid;

use crate::common::{TestApp, routes};

const CSV: &[u8] = b"name,price,category,description\nLamp,19.99,5,Desk lamp\n";

async fn setup() -> (TestApp, String) {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("clerk", "securepass").await;
    (app, token)
}

/// UUID v4 from a recorded `app/upload/importations/<uuid>.csv` path.
fn recorded_uuid(path: &str) -> Uuid {
    let file_name = path
        .strip_prefix("app/upload/importations/")
        .unwrap_or_else(|| panic!("unexpected import path: {path}"));
    let stem = file_name
        .strip_suffix(".csv")
        .unwrap_or_else(|| panic!("import path should end in .csv: {path}"));
    Uuid::parse_str(stem).expect("import file name should be a UUID")
}

mod upload {
    use super::*;

    #[tokio::test]
    async fn csv_upload_is_recorded_and_stored() {
        let (app, token) = setup().await;
        let me = app.get_with_token(routes::ME, &token).await;

        let res = app
            .upload_with_token("products.csv", "text/csv", CSV.to_vec(), &token)
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["alert"]["type"], "success");
        assert_eq!(
            res.body["alert"]["message"],
            "File uploaded. You will be notified by email when importation finish"
        );
        assert_eq!(res.body["redirect_to"], routes::PRODUCTS);

        let rows = app.importations().await;
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(res.body["data"]["path"], row.path.as_str());
        assert_eq!(res.body["data"]["user_id"], me.id());
        assert_eq!(recorded_uuid(&row.path).get_version_num(), 4);

        let stored = std::fs::read(app.stored_file(&row.path)).expect("stored file missing");
        assert_eq!(stored, CSV);
    }

    #[tokio::test]
    async fn plain_text_upload_is_accepted_and_stored_as_csv() {
        let (app, token) = setup().await;

        let res = app
            .upload_with_token("dump.txt", "text/plain", b"a;b;c\n".to_vec(), &token)
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        let path = res.body["data"]["path"].as_str().expect("path should be a string");
        recorded_uuid(path);
        assert!(app.stored_file(path).is_file());
    }

    #[tokio::test]
    async fn each_upload_gets_its_own_file() {
        let (app, token) = setup().await;

        for _ in 0..2 {
            let res = app
                .upload_with_token("products.csv", "text/csv", CSV.to_vec(), &token)
                .await;
            assert_eq!(res.status, 201, "{}", res.text);
        }

        let rows = app.importations().await;
        assert_eq!(rows.len(), 2);
        assert_ne!(rows[0].path, rows[1].path);
    }

    #[tokio::test]
    async fn file_at_the_size_limit_is_accepted() {
        let (app, token) = setup().await;
        let limit = app.config.storage.max_import_bytes() as usize;

        let res = app
            .upload_with_token("big.csv", "text/csv", vec![b'a'; limit], &token)
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
    }

    #[tokio::test]
    async fn upload_requires_authentication() {
        let app = TestApp::spawn().await;

        let res = app
            .client
            .post(format!("http://{}{}", app.addr, routes::IMPORT))
            .multipart(Form::new().part("file", Part::bytes(CSV.to_vec()).file_name("p.csv")))
            .send()
            .await
            .expect("Failed to send request");

        assert_eq!(res.status().as_u16(), 401);
        assert!(app.importations().await.is_empty());
    }
}

mod rejected {
    use super::*;

    async fn assert_rejected(app: &TestApp, res: crate::common::TestResponse, message: &str) {
        assert_eq!(res.status, 422, "{}", res.text);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(
            res.field_errors("file").iter().any(|m| m == message),
            "expected {message:?} in {}",
            res.text
        );
        assert!(app.importations().await.is_empty());
        let dir = app.storage_root().join("app/upload/importations");
        let stored = std::fs::read_dir(&dir).map(|d| d.count()).unwrap_or(0);
        assert_eq!(stored, 0, "no file should be written");
    }

    #[tokio::test]
    async fn oversized_file_fails_validation() {
        let (app, token) = setup().await;
        let limit = app.config.storage.max_import_bytes() as usize;

        let res = app
            .upload_with_token("big.csv", "text/csv", vec![b'a'; limit + 1], &token)
            .await;

        assert_rejected(&app, res, "The file may not be greater than 5120 kilobytes.").await;
    }

    #[tokio::test]
    async fn pdf_fails_validation() {
        let (app, token) = setup().await;

        let res = app
            .upload_with_token(
                "catalog.pdf",
                "application/pdf",
                b"%PDF-1.7 fake".to_vec(),
                &token,
            )
            .await;

        assert_rejected(&app, res, "The file must be a file of type: csv, txt.").await;
    }

    #[tokio::test]
    async fn binary_renamed_to_csv_fails_validation() {
        let (app, token) = setup().await;

        let res = app
            .upload_with_token(
                "image.csv",
                "text/csv",
                vec![0x89, b'P', b'N', b'G', 0, 0, 0, 13],
                &token,
            )
            .await;

        assert_rejected(&app, res, "The file must be a file of type: csv, txt.").await;
    }

    #[tokio::test]
    async fn missing_file_field_fails_validation() {
        let (app, token) = setup().await;

        let form = Form::new().text("note", "no file here");
        let res = app.upload_form_with_token(form, &token).await;

        assert_rejected(&app, res, "The file field is required.").await;
    }

    #[tokio::test]
    async fn smaller_configured_limit_is_enforced() {
        let app = TestApp::spawn_with(|c| c.storage.max_import_kb = 1).await;
        let token = app.create_authenticated_user("clerk", "securepass").await;

        let res = app
            .upload_with_token("p.csv", "text/csv", vec![b'a'; 1025], &token)
            .await;

        assert_rejected(&app, res, "The file may not be greater than 1 kilobytes.").await;
    }
}

mod storage_failure {
    use super::*;

    #[tokio::test]
    async fn failed_write_keeps_the_importation_row() {
        let (app, token) = setup().await;
        // A plain file where the import directory should be.
        let upload_dir = app.storage_root().join("app/upload");
        std::fs::create_dir_all(&upload_dir).unwrap();
        std::fs::write(upload_dir.join("importations"), b"").unwrap();

        let res = app
            .upload_with_token("products.csv", "text/csv", CSV.to_vec(), &token)
            .await;

        assert_eq!(res.status, 500, "{}", res.text);
        assert_eq!(res.body["code"], "INTERNAL_ERROR");
        assert_eq!(app.importations().await.len(), 1);
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn user_sees_only_their_imports_newest_first() {
        let (app, token) = setup().await;
        let other = app.create_authenticated_user("buyer", "securepass").await;

        let first = app
            .upload_with_token("a.csv", "text/csv", CSV.to_vec(), &token)
            .await;
        let second = app
            .upload_with_token("b.csv", "text/csv", CSV.to_vec(), &token)
            .await;
        app.upload_with_token("c.csv", "text/csv", CSV.to_vec(), &other)
            .await;

        let res = app.get_with_token(routes::IMPORTS, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["total"], 2);
        assert_eq!(res.body["data"][0]["id"], second.body["data"]["id"]);
        assert_eq!(res.body["data"][1]["id"], first.body["data"]["id"]);
    }
}

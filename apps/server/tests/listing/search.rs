use crate::support::*;
use axum::http::StatusCode;

async fn seed(app: &TestApp) -> anyhow::Result<()> {
    let pharmacy = app.add_pharmacy(PharmacyBuilder::new("Central").build()).await;
    let medicines = [
        MedicineBuilder::new(pharmacy, "Panadol Extra").created_minutes_after(1),
        MedicineBuilder::new(pharmacy, "Brufen")
            .description("ibuprofen, stronger than PANADOL for some pain")
            .created_minutes_after(2),
        MedicineBuilder::new(pharmacy, "A+B (test)").created_minutes_after(3),
        MedicineBuilder::new(pharmacy, "AAB test").created_minutes_after(4),
        MedicineBuilder::new(pharmacy, "Panadol Night")
            .inactive()
            .created_minutes_after(5),
        MedicineBuilder::new(pharmacy, "50% off_vitamin").created_minutes_after(6),
        MedicineBuilder::new(pharmacy, "500 mg vitamin C").created_minutes_after(7),
    ];
    for m in medicines {
        app.add_medicine(m.build()).await;
    }
    Ok(())
}

#[tokio::test]
async fn search_matches_name_or_description_case_insensitively() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    seed(&app).await?;

    let (status, body) = app.get_json("/api/v1/medicines?search=panadol").await?;
    assert_status(status, StatusCode::OK, "search panadol");
    let data = assert_listing(&body)?;

    // Newest first; the inactive "Panadol Night" is never listed.
    assert_eq!(medicine_names(&body)?, vec!["Brufen", "Panadol Extra"]);
    assert_eq!(data["pagination"]["totalItems"], 2);
    Ok(())
}

#[tokio::test]
async fn search_term_is_literal_text() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    seed(&app).await?;

    // "A+B (test)" as a pattern would also match "AAB test".
    let (status, body) = app
        .get_json("/api/v1/medicines?search=A%2BB%20(test)")
        .await?;
    assert_status(status, StatusCode::OK, "search with pattern metacharacters");
    assert_eq!(medicine_names(&body)?, vec!["A+B (test)"]);

    let (_, body) = app.get_json("/api/v1/medicines?search=50%25%20off_").await?;
    assert_eq!(medicine_names(&body)?, vec!["50% off_vitamin"]);
    Ok(())
}

#[tokio::test]
async fn malformed_pattern_text_is_not_an_error() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    seed(&app).await?;

    for term in ["%5B", "(", "*", "%5C", "a%7B2,", "%5E%24"] {
        let (status, body) = app
            .get_json(&format!("/api/v1/medicines?search={term}"))
            .await?;
        assert_status(status, StatusCode::OK, term);
        assert_listing(&body)?;
    }
    Ok(())
}

#[tokio::test]
async fn blank_search_lists_everything_active() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    seed(&app).await?;

    for query in ["", "?search=", "?search=%20%20%20"] {
        let (_, body) = app.get_json(&format!("/api/v1/medicines{query}")).await?;
        assert_eq!(pagination(&body)?["totalItems"], 6, "query {query:?}");
    }
    Ok(())
}

#[tokio::test]
async fn search_total_drives_pagination() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    seed(&app).await?;

    let (_, body) = app
        .get_json("/api/v1/medicines?q=vitamin&pageSize=1&page=1")
        .await?;
    let p = pagination(&body)?;
    assert_eq!(p["totalItems"], 2);
    assert_eq!(p["totalPages"], 2);
    assert_eq!(p["hasNextPage"], true);
    assert_eq!(medicine_names(&body)?, vec!["500 mg vitamin C"]);
    Ok(())
}

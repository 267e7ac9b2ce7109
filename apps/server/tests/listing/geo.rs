use crate::support::*;
use axum::http::StatusCode;
use catalog::models::GeoPoint;
use serde_json::Value;
use uuid::Uuid;

const CAIRO: (f64, f64) = (30.0444, 31.2357);

struct Seeded {
    near: Uuid,
    far: Uuid,
    unlocated: Uuid,
}

/// Near pharmacy ~1.2 km from Cairo, far one ~340 km north, one without a location.
async fn seed(app: &TestApp) -> anyhow::Result<Seeded> {
    let near = app
        .add_pharmacy(PharmacyBuilder::new("Near").at(30.0552, 31.2357).build())
        .await;
    let far = app
        .add_pharmacy(PharmacyBuilder::new("Far").at(33.1021, 31.2357).build())
        .await;
    let unlocated = app.add_pharmacy(PharmacyBuilder::new("Nowhere").build()).await;

    // Names sort opposite to distance; the unlocated record is the newest.
    app.add_medicine(
        MedicineBuilder::new(far, "Aspirin (far)")
            .created_minutes_after(1)
            .build(),
    )
    .await;
    app.add_medicine(
        MedicineBuilder::new(near, "Zinc (near)")
            .created_minutes_after(2)
            .build(),
    )
    .await;
    app.add_medicine(
        MedicineBuilder::new(unlocated, "Mystery (no location)")
            .created_minutes_after(3)
            .build(),
    )
    .await;

    Ok(Seeded {
        near,
        far,
        unlocated,
    })
}

fn distances(body: &Value) -> anyhow::Result<Vec<Option<f64>>> {
    Ok(medicines(body)?
        .iter()
        .map(|m| m["distanceKm"].as_f64())
        .collect())
}

fn cairo_query() -> String {
    format!("latitude={}&longitude={}", CAIRO.0, CAIRO.1)
}

#[tokio::test]
async fn ranks_nearest_first_and_ignores_requested_sort() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    seed(&app).await?;

    let (status, body) = app
        .get_json(&format!(
            "/api/v1/medicines?{}&sort=name&order=asc&pageSize=10",
            cairo_query()
        ))
        .await?;
    assert_status(status, StatusCode::OK, "ranked listing");
    let data = assert_listing(&body)?;

    assert_eq!(
        medicine_names(&body)?,
        vec!["Zinc (near)", "Aspirin (far)", "Mystery (no location)"]
    );
    assert_eq!(data["rankedByDistance"], true);
    assert!(data.get("sort").is_none(), "ranked responses carry no sort");

    let d = distances(&body)?;
    let near = d[0].expect("near distance");
    let far = d[1].expect("far distance");
    assert!((1.1..1.3).contains(&near), "near = {near}");
    assert!((335.0..345.0).contains(&far), "far = {far}");
    assert_eq!(near, 1.2);
    assert_eq!(far, 340.0);

    let unlocated = &medicines(&body)?[2];
    assert!(unlocated.get("distanceKm").is_some());
    assert!(unlocated["distanceKm"].is_null());
    Ok(())
}

#[tokio::test]
async fn short_coordinate_aliases_are_accepted() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    seed(&app).await?;

    let (_, body) = app
        .get_json(&format!("/api/v1/medicines?lat={}&lng={}", CAIRO.0, CAIRO.1))
        .await?;
    assert_eq!(assert_listing(&body)?["rankedByDistance"], true);
    assert_eq!(
        medicine_names(&body)?.first().map(String::as_str),
        Some("Zinc (near)")
    );
    Ok(())
}

#[tokio::test]
async fn incomplete_or_invalid_coordinates_leave_listing_unranked() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    seed(&app).await?;

    for query in [
        "latitude=30.0444",
        "longitude=31.2357",
        "latitude=abc&longitude=31.2357",
        "latitude=95&longitude=31.2357",
        "latitude=30&longitude=-181",
    ] {
        let (status, body) = app.get_json(&format!("/api/v1/medicines?{query}")).await?;
        assert_status(status, StatusCode::OK, query);
        let data = assert_listing(&body)?;
        assert!(data.get("rankedByDistance").is_none(), "{query}");
        assert!(data.get("sort").is_some(), "{query}");
        assert!(
            medicines(&body)?.iter().all(|m| m.get("distanceKm").is_none()),
            "{query}"
        );
        // Natural order: newest first.
        assert_eq!(
            medicine_names(&body)?,
            vec!["Mystery (no location)", "Zinc (near)", "Aspirin (far)"],
            "{query}"
        );
    }
    Ok(())
}

#[tokio::test]
async fn stored_requester_location_is_the_fallback() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    seed(&app).await?;

    let (status, body) = app
        .get_json_as("/api/v1/medicines", Some(GeoPoint::new(CAIRO.0, CAIRO.1)))
        .await?;
    assert_status(status, StatusCode::OK, "stored location");
    assert_eq!(assert_listing(&body)?["rankedByDistance"], true);
    assert_eq!(distances(&body)?[0], Some(1.2));

    // No stored location: anonymous-style unranked listing.
    let (_, body) = app.get_json_as("/api/v1/medicines", None).await?;
    assert!(assert_listing(&body)?.get("rankedByDistance").is_none());

    // An out-of-range stored location is ignored.
    let (_, body) = app
        .get_json_as("/api/v1/medicines", Some(GeoPoint::new(200.0, 31.0)))
        .await?;
    assert!(assert_listing(&body)?.get("rankedByDistance").is_none());
    Ok(())
}

#[tokio::test]
async fn explicit_coordinates_override_stored_location() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    seed(&app).await?;

    // Stored next to the far pharmacy, asking from Cairo.
    let (_, body) = app
        .get_json_as(
            &format!("/api/v1/medicines?{}", cairo_query()),
            Some(GeoPoint::new(33.1021, 31.2357)),
        )
        .await?;
    assert_eq!(
        medicine_names(&body)?.first().map(String::as_str),
        Some("Zinc (near)")
    );

    let (_, body) = app
        .get_json_as("/api/v1/medicines", Some(GeoPoint::new(33.1021, 31.2357)))
        .await?;
    assert_eq!(
        medicine_names(&body)?.first().map(String::as_str),
        Some("Aspirin (far)")
    );
    assert_eq!(distances(&body)?[0], Some(0.0));
    Ok(())
}

#[tokio::test]
async fn invalid_explicit_coordinates_skip_stored_location() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    seed(&app).await?;
    let stored = Some(GeoPoint::new(CAIRO.0, CAIRO.1));

    for query in [
        "latitude=abc&longitude=31",
        "latitude=95&longitude=31",
        "latitude=30.0444",
    ] {
        let (status, body) = app
            .get_json_as(&format!("/api/v1/medicines?{query}"), stored)
            .await?;
        assert_status(status, StatusCode::OK, query);
        let data = assert_listing(&body)?;
        assert!(data.get("rankedByDistance").is_none(), "{query}");
        assert!(data.get("sort").is_some(), "{query}");
        assert_eq!(
            medicine_names(&body)?,
            vec!["Mystery (no location)", "Zinc (near)", "Aspirin (far)"],
            "{query}"
        );
    }
    Ok(())
}

#[tokio::test]
async fn ranked_sequence_is_paged_in_memory() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    seed(&app).await?;

    let base = format!("/api/v1/medicines?{}&pageSize=2", cairo_query());
    let (_, first) = app.get_json(&format!("{base}&page=1")).await?;
    let (_, second) = app.get_json(&format!("{base}&page=2")).await?;

    assert_eq!(medicine_names(&first)?, vec!["Zinc (near)", "Aspirin (far)"]);
    assert_eq!(medicine_names(&second)?, vec!["Mystery (no location)"]);

    let p = pagination(&second)?;
    assert_eq!(p["totalItems"], 3);
    assert_eq!(p["totalPages"], 2);
    assert_eq!(p["hasNextPage"], false);
    assert_eq!(p["hasPrevPage"], true);
    Ok(())
}

#[tokio::test]
async fn pharmacy_scoped_listing_ranks_its_own_records() -> anyhow::Result<()> {
    let app = TestApp::new()?;
    let seeded = seed(&app).await?;
    app.add_medicine(
        MedicineBuilder::new(seeded.near, "Vitamin D (near)")
            .created_minutes_after(10)
            .build(),
    )
    .await;

    let (status, body) = app
        .get_json(&format!(
            "/api/v1/pharmacies/{}/medicines?{}",
            seeded.near,
            cairo_query()
        ))
        .await?;
    assert_status(status, StatusCode::OK, "pharmacy listing");
    assert_listing(&body)?;
    assert_eq!(pagination(&body)?["totalItems"], 2);
    assert!(distances(&body)?.iter().all(|d| *d == Some(1.2)));
    // Equal distances keep the natural (newest first) order.
    assert_eq!(
        medicine_names(&body)?,
        vec!["Vitamin D (near)", "Zinc (near)"]
    );

    let (_, body) = app
        .get_json(&format!("/api/v1/pharmacies/{}/medicines", seeded.unlocated))
        .await?;
    assert_eq!(medicine_names(&body)?, vec!["Mystery (no location)"]);

    let (_, body) = app
        .get_json(&format!("/api/v1/pharmacies/{}/medicines", seeded.far))
        .await?;
    assert_eq!(medicine_names(&body)?, vec!["Aspirin (far)"]);
    Ok(())
}

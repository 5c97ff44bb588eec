//! Vector layer upload against a live deployment.

use crate::common::live_harness;

/// A plain shapefile imports end to end: wizard success, layer page, map
/// server catalogs, and (when a database is configured) attribute and link
/// bookkeeping.
#[tokio::test]
#[ignore = "needs a live portal deployment"]
async fn test_shapefile_upload() {
    let Some(harness) = live_harness().await else {
        return;
    };

    let layer_name = "san_andres_y_providencia_water";
    let path = harness.data.vector(&format!("{}.shp", layer_name));

    let page = harness
        .uploads
        .upload_and_complete(&path, layer_name, false)
        .await
        .expect("shapefile upload");
    harness
        .verifier
        .check_layer_complete(&page, layer_name)
        .await
        .expect("layer verification");

    let Some(db) = harness.verifier.database() else {
        return;
    };

    let attributes = db
        .layer_attribute_count(layer_name)
        .await
        .expect("attribute query");
    assert!(
        attributes > 0,
        "expected registered attributes for {}",
        layer_name
    );

    let links = db
        .resource_links(layer_name, &["original", "metadata"])
        .await
        .expect("link query");
    assert!(
        links.iter().any(|link| link.link_type == "original"),
        "no 'original' link registered for {}",
        layer_name
    );
    assert!(
        links.iter().any(|link| link.link_type == "metadata"),
        "no 'metadata' link registered for {}",
        layer_name
    );
    for link in &links {
        assert!(
            !link.url.is_empty(),
            "empty URL on {} link {}",
            link.link_type,
            link.name
        );
    }
}

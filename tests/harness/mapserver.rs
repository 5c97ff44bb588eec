//! Map server probes and the composite verifier against the stub.

use bytes::Bytes;
use layerprobe::mapserver::{MapServerRest, WmsClient};
use layerprobe::portal::UploadClient;

use crate::common::{StubLayer, StubOptions, spawn_stub};

#[tokio::test]
async fn test_rest_layer_lookup() {
    let stub = spawn_stub(StubOptions {
        layers: vec![StubLayer::named("geonode:relief")],
        ..Default::default()
    })
    .await;
    let rest = MapServerRest::new(stub.mapserver_config()).unwrap();

    let layer = rest
        .get_layer("relief")
        .await
        .expect("rest request")
        .expect("layer should be in the catalog");
    assert_eq!(layer.name, "relief");
    assert_eq!(layer.default_style.unwrap().name, "default");
}

#[tokio::test]
async fn test_rest_missing_layer_is_none() {
    let stub = spawn_stub(StubOptions::default()).await;
    let rest = MapServerRest::new(stub.mapserver_config()).unwrap();

    let layer = rest.get_layer("nothing_here").await.expect("rest request");
    assert!(layer.is_none());
}

#[tokio::test]
async fn test_capabilities_over_http() {
    let stub = spawn_stub(StubOptions {
        layers: vec![
            StubLayer::named("geonode:relief"),
            StubLayer::named("geonode:boxes_with_date").with_time_positions(&[
                "2000-03-01T00:00:00.000Z",
                "2000-03-02T00:00:00.000Z",
                "2000-03-03T00:00:00.000Z",
            ]),
        ],
        ..Default::default()
    })
    .await;
    let wms = WmsClient::new(stub.mapserver_config()).unwrap();

    let caps = wms.capabilities(None).await.expect("capabilities fetch");
    assert_eq!(caps.layers.len(), 2);

    let layer = caps.layer("boxes_with_date").expect("time layer");
    assert_eq!(layer.time_positions.len(), 3);
}

#[tokio::test]
async fn test_scoped_capabilities_only_describe_one_layer() {
    let stub = spawn_stub(StubOptions {
        layers: vec![
            StubLayer::named("geonode:relief"),
            StubLayer::named("geonode:roads"),
        ],
        ..Default::default()
    })
    .await;
    let wms = WmsClient::new(stub.mapserver_config()).unwrap();

    let caps = wms
        .capabilities(Some("geonode:roads"))
        .await
        .expect("scoped capabilities fetch");
    assert_eq!(caps.layer_names(), vec!["geonode:roads"]);
}

#[tokio::test]
async fn test_composite_verification_after_upload() {
    let stub = spawn_stub(StubOptions {
        layers: vec![StubLayer::named("geonode:relief")],
        ..Default::default()
    })
    .await;
    let session = stub.logged_in_session().await;
    let uploads = UploadClient::new(session.clone());
    let verifier = stub.verifier(session);

    let saved = uploads
        .upload_bytes("relief.tif", Bytes::from_static(b"tif"))
        .await
        .expect("save step");
    uploads.wait_for_progress(&saved).await.expect("progress");
    let page = uploads
        .finish_upload(&saved, "relief", true)
        .await
        .expect("final step");

    verifier
        .check_layer_complete(&page, "relief")
        .await
        .expect("layer should verify everywhere");
}

#[tokio::test]
async fn test_verification_fails_when_catalog_is_missing_the_layer() {
    let stub = spawn_stub(StubOptions::default()).await;
    let session = stub.logged_in_session().await;
    let verifier = stub.verifier(session);

    // page exists, but the map server has never heard of the layer
    let err = verifier
        .check_layer_complete("/layers/geonode:ghost", "ghost")
        .await
        .unwrap_err();
    assert!(
        err.to_string().contains("missing from the map server catalog"),
        "unexpected error: {}",
        err
    );
}

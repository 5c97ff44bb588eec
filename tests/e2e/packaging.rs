//! Zipped shapefile upload against a live deployment.

use layerprobe::fixtures::zip_family;

use crate::common::live_harness;

#[tokio::test]
#[ignore = "needs a live portal deployment"]
async fn test_zipped_shapefile_upload() {
    let Some(harness) = live_harness().await else {
        return;
    };

    let layer_name = "san_andres_y_providencia_poi";

    let archive = zip_family(&harness.data.vector_dir(), layer_name).expect("zip fixture");
    let page = harness
        .uploads
        .upload_and_complete(archive.path(), layer_name, false)
        .await
        .expect("zipped upload");
    harness
        .verifier
        .check_layer_complete(&page, layer_name)
        .await
        .expect("layer verification");
}

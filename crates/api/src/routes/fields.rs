use axum::Router;
use ifdo_db::models::fields::*;

use super::crud::{crud_router, CrudOps};
use crate::state::AppState;

/// Vocabulary and parameter-set tables mounted at `/fields`, one generic CRUD
/// router per table.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/image_contexts", named::<ImageContext>())
        .nest("/image_projects", named::<ImageProject>())
        .nest("/image_events", named::<ImageEvent>())
        .nest("/image_platforms", named::<ImagePlatform>())
        .nest("/image_sensors", named::<ImageSensor>())
        .nest("/image_pis", named::<ImagePi>())
        .nest("/image_creators", named::<ImageCreator>())
        .nest("/image_licenses", named::<ImageLicense>())
        .nest(
            "/image_camera_poses",
            params::<ImageCameraPose, ImageCameraPoseInput>(),
        )
        .nest(
            "/image_camera_housing_viewports",
            params::<ImageCameraHousingViewport, ImageCameraHousingViewportInput>(),
        )
        .nest(
            "/image_flatport_parameters",
            params::<ImageFlatportParameter, ImageFlatportParameterInput>(),
        )
        .nest(
            "/image_domeport_parameters",
            params::<ImageDomeportParameter, ImageDomeportParameterInput>(),
        )
        .nest(
            "/image_camera_calibration_models",
            params::<ImageCameraCalibrationModel, ImageCameraCalibrationModelInput>(),
        )
        .nest(
            "/image_photometric_calibrations",
            params::<ImagePhotometricCalibration, ImagePhotometricCalibrationInput>(),
        )
        .nest(
            "/image_set_related_materials",
            params::<ImageSetRelatedMaterial, ImageSetRelatedMaterialInput>(),
        )
}

fn named<R: ifdo_db::resource::Resource + Sync>() -> Router<AppState> {
    crud_router::<R, CreateNamedLookup, UpdateNamedLookup>(CrudOps::ALL)
}

/// Parameter sets share one all-optional DTO for create and update.
fn params<R, I>() -> Router<AppState>
where
    R: ifdo_db::resource::Resource + Sync,
    I: serde::de::DeserializeOwned + serde::Serialize + Send + Sync + 'static,
{
    crud_router::<R, I, I>(CrudOps::ALL)
}

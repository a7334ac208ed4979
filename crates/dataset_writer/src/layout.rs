//! On-disk dataset layout names.

pub const SAMPLES_GROUP: &str = "samples";
pub const TIMESTAMPS: &str = "timestamps";
pub const CHUNK_IDS: &str = "chunk_ids";

pub const LIDAR_GROUP: &str = "lidar";
pub const LIDAR_DATA: &str = "data";
pub const LIDAR_OFFSETS: &str = "offsets";
pub const LIDAR_COUNTS: &str = "counts";

pub const CAMERA_GROUP: &str = "camera";
pub const CAMERA_IMAGES: &str = "images";

pub const TRANSFORMS_GROUP: &str = "transforms";
pub const STATIC_TRANSFORMS_GROUP: &str = "static_transforms";

pub const ATTR_NUM_SAMPLES: &str = "num_samples";
pub const ATTR_POINT_OFFSET: &str = "lidar_point_offset";
pub const ATTR_CAMERA_K: &str = "camera_k";
pub const ATTR_CAMERA_D: &str = "camera_d";
pub const ATTR_CAMERA_R: &str = "camera_r";
pub const ATTR_CAMERA_P: &str = "camera_p";
pub const ATTR_DISTORTION_MODEL: &str = "distortion_model";
pub const ATTR_CAMERA_WIDTH: &str = "camera_width";
pub const ATTR_CAMERA_HEIGHT: &str = "camera_height";

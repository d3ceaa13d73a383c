use super::ImageService;
use crate::models::{Dimensions, ImageType};
use crate::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::{Arc, Mutex};

/// In-memory [`ImageService`] that reports fixed dimensions and encodes each
/// resize as the text `"<type>:<width>x<height>"`.
#[derive(Clone)]
pub struct MockImageProcessor {
    dimensions: Dimensions,
    inspect_count: Arc<Mutex<usize>>,
    resize_calls: Arc<Mutex<Vec<Dimensions>>>,
    failing_target: Arc<Mutex<Option<Dimensions>>>,
    panicking_target: Arc<Mutex<Option<Dimensions>>>,
    inspect_should_fail: Arc<Mutex<bool>>,
}

impl MockImageProcessor {
    pub fn new() -> Self {
        Self {
            dimensions: Dimensions::new(1000, 1000),
            inspect_count: Arc::new(Mutex::new(0)),
            resize_calls: Arc::new(Mutex::new(Vec::new())),
            failing_target: Arc::new(Mutex::new(None)),
            panicking_target: Arc::new(Mutex::new(None)),
            inspect_should_fail: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.dimensions = Dimensions::new(width, height);
        self
    }

    /// Fail any resize whose target matches `width` x `height`.
    pub fn with_failing_target(self, width: u32, height: u32) -> Self {
        *self.failing_target.lock().unwrap() = Some(Dimensions::new(width, height));
        self
    }

    /// Panic on any resize whose target matches `width` x `height`.
    pub fn with_panicking_target(self, width: u32, height: u32) -> Self {
        *self.panicking_target.lock().unwrap() = Some(Dimensions::new(width, height));
        self
    }

    pub fn with_inspect_failure(self, should_fail: bool) -> Self {
        *self.inspect_should_fail.lock().unwrap() = should_fail;
        self
    }

    pub fn get_inspect_count(&self) -> usize {
        *self.inspect_count.lock().unwrap()
    }

    pub fn get_resize_count(&self) -> usize {
        self.resize_calls.lock().unwrap().len()
    }

    pub fn get_resize_calls(&self) -> Vec<Dimensions> {
        self.resize_calls.lock().unwrap().clone()
    }

    pub fn encode(image_type: ImageType, target: Dimensions) -> Bytes {
        Bytes::from(format!("{}:{}x{}", image_type, target.width, target.height))
    }
}

impl Default for MockImageProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageService for MockImageProcessor {
    async fn inspect_size(&self, _data: Bytes) -> Result<Dimensions> {
        *self.inspect_count.lock().unwrap() += 1;

        if *self.inspect_should_fail.lock().unwrap() {
            return Err(Error::Inspect("Mock inspect failure".to_string()));
        }
        Ok(self.dimensions)
    }

    async fn resize(
        &self,
        _data: Bytes,
        image_type: ImageType,
        target: Dimensions,
    ) -> Result<Bytes> {
        self.resize_calls.lock().unwrap().push(target);

        if *self.panicking_target.lock().unwrap() == Some(target) {
            panic!("Mock resize panic at {}x{}", target.width, target.height);
        }

        if *self.failing_target.lock().unwrap() == Some(target) {
            return Err(Error::Image(image::ImageError::IoError(
                std::io::Error::other("Mock failure"),
            )));
        }
        Ok(Self::encode(image_type, target))
    }
}

//! MSDF atlas image: decode off the render thread, upload once.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

#[derive(Debug, thiserror::Error)]
pub enum AtlasError {
    #[error("failed to read atlas {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode atlas image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("atlas image is empty ({width}x{height})")]
    Empty { width: u32, height: u32 },

    #[error("atlas loader thread exited without a result")]
    Disconnected,
}

/// Decoded RGBA8 atlas pixels. Channels hold distances, not color.
#[derive(Clone, Debug, PartialEq)]
pub struct AtlasImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl AtlasImage {
    pub fn decode(bytes: &[u8]) -> Result<Self, AtlasError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(AtlasError::Empty { width, height });
        }

        Ok(Self {
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, AtlasError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| AtlasError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::decode(&bytes)
    }

    pub fn size(&self) -> [u32; 2] {
        [self.width, self.height]
    }

    /// Linear RGBA8 texture with the pixels uploaded.
    pub fn upload(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> wgpu::Texture {
        let size = wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("MSDF Atlas"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            // Not sRGB: the channels are distances.
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &self.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * self.width),
                rows_per_image: Some(self.height),
            },
            size,
        );

        texture
    }
}

/// What the render loop learns from one [`AtlasLoader::poll`].
#[derive(Debug)]
pub enum AtlasPoll {
    Pending,
    Ready(AtlasImage),
    Failed(AtlasError),
    /// The result was already delivered.
    Done,
}

/// Decodes one atlas on a background thread.
pub struct AtlasLoader {
    path: PathBuf,
    receiver: Option<Receiver<Result<AtlasImage, AtlasError>>>,
}

impl AtlasLoader {
    pub fn spawn(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (sender, receiver) = mpsc::channel();

        let thread_path = path.clone();
        let spawned = thread::Builder::new()
            .name("atlas-loader".into())
            .spawn(move || {
                let result = AtlasImage::load(&thread_path);
                // The receiver may be gone if the app already exited.
                let _ = sender.send(result);
            });

        let receiver = match spawned {
            Ok(_) => {
                log::debug!("Loading atlas {} in background", path.display());
                Some(receiver)
            }
            Err(e) => {
                log::error!("Failed to spawn atlas loader thread: {e}");
                // Decode inline so the result is still delivered through the same channel.
                let (sender, receiver) = mpsc::channel();
                let _ = sender.send(AtlasImage::load(&path));
                Some(receiver)
            }
        };

        Self { path, receiver }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Non-blocking. Yields `Ready` or `Failed` exactly once.
    pub fn poll(&mut self) -> AtlasPoll {
        let Some(receiver) = self.receiver.as_ref() else {
            return AtlasPoll::Done;
        };

        let result = match receiver.try_recv() {
            Ok(Ok(image)) => AtlasPoll::Ready(image),
            Ok(Err(e)) => AtlasPoll::Failed(e),
            Err(TryRecvError::Empty) => return AtlasPoll::Pending,
            Err(TryRecvError::Disconnected) => AtlasPoll::Failed(AtlasError::Disconnected),
        };

        self.receiver = None;
        result
    }
}

/// Atlas state as shown in the diagnostics panel.
#[derive(Clone, Debug, PartialEq)]
pub enum AtlasStatus {
    Loading,
    Ready { width: u32, height: u32 },
    Failed(String),
}

impl AtlasStatus {
    /// Fold one poll result into the status. Returns the image only when it is ready to
    /// upload; a failed load never produces one, so no text mesh gets built from it.
    pub fn update(&mut self, poll: AtlasPoll, path: &Path) -> Option<AtlasImage> {
        match poll {
            AtlasPoll::Pending | AtlasPoll::Done => None,
            AtlasPoll::Ready(atlas) => {
                *self = AtlasStatus::Ready {
                    width: atlas.width,
                    height: atlas.height,
                };
                Some(atlas)
            }
            AtlasPoll::Failed(e) => {
                log::error!(
                    "Failed to load atlas {}: {e}; text mesh will not be shown",
                    path.display()
                );
                *self = AtlasStatus::Failed(e.to_string());
                None
            }
        }
    }
}

impl std::fmt::Display for AtlasStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AtlasStatus::Loading => write!(f, "loading"),
            AtlasStatus::Ready { width, height } => write!(f, "ready ({width}x{height})"),
            AtlasStatus::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::{Duration, Instant};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([x as u8 * 10, y as u8 * 10, 128, 255])
        });
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn wait_for(loader: &mut AtlasLoader) -> AtlasPoll {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            match loader.poll() {
                AtlasPoll::Pending if Instant::now() < deadline => {
                    std::thread::sleep(Duration::from_millis(5))
                }
                other => return other,
            }
        }
    }

    #[test]
    fn test_decode_png() {
        let atlas = AtlasImage::decode(&png_bytes(3, 2)).unwrap();
        assert_eq!(atlas.size(), [3, 2]);
        assert_eq!(atlas.pixels.len(), 3 * 2 * 4);
        assert_eq!(&atlas.pixels[4..8], &[10, 0, 128, 255]);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = AtlasImage::decode(b"not a png").unwrap_err();
        assert!(matches!(err, AtlasError::Decode(_)));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = AtlasImage::load("/definitely/not/here.png").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.png"));
    }

    #[test]
    fn test_loader_delivers_failure_once() {
        let mut loader = AtlasLoader::spawn("/definitely/not/here.png");
        assert!(matches!(wait_for(&mut loader), AtlasPoll::Failed(AtlasError::Io { .. })));
        assert!(matches!(loader.poll(), AtlasPoll::Done));
    }

    #[test]
    fn test_loader_delivers_image() {
        let path = std::env::temp_dir().join(format!("msdf-atlas-test-{}.png", std::process::id()));
        std::fs::write(&path, png_bytes(4, 4)).unwrap();

        let mut loader = AtlasLoader::spawn(&path);
        match wait_for(&mut loader) {
            AtlasPoll::Ready(image) => assert_eq!(image.size(), [4, 4]),
            other => panic!("unexpected poll result: {other:?}"),
        }

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(AtlasStatus::Ready { width: 512, height: 256 }.to_string(), "ready (512x256)");
        assert_eq!(AtlasStatus::Loading.to_string(), "loading");
    }

    #[test]
    fn test_failed_poll_yields_no_atlas() {
        let mut status = AtlasStatus::Loading;
        let failed = AtlasPoll::Failed(AtlasError::Empty {
            width: 0,
            height: 0,
        });

        let mesh_source = status.update(failed, Path::new("missing.png"));
        assert!(mesh_source.is_none());
        assert!(matches!(status, AtlasStatus::Failed(_)));

        // Later polls never revive it.
        assert!(status.update(AtlasPoll::Done, Path::new("missing.png")).is_none());
        assert!(matches!(status, AtlasStatus::Failed(_)));
    }

    #[test]
    fn test_ready_poll_yields_atlas_once() {
        let mut status = AtlasStatus::Loading;
        let atlas = AtlasImage::decode(&png_bytes(2, 3)).unwrap();

        assert!(status.update(AtlasPoll::Pending, Path::new("a.png")).is_none());
        assert_eq!(status, AtlasStatus::Loading);

        let uploaded = status.update(AtlasPoll::Ready(atlas.clone()), Path::new("a.png"));
        assert_eq!(uploaded, Some(atlas));
        assert_eq!(status, AtlasStatus::Ready { width: 2, height: 3 });
    }
}

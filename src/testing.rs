//! Test doubles and fixtures shared by the unit tests.

use crate::command::{CommandOutput, CommandRunner};
use crate::config::Config;
use async_trait::async_trait;
use image::{Rgb, RgbImage};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// Bytes written by the fake `cwebp`
pub const FAKE_WEBP: &[u8] = b"RIFF\x0c\0\0\0WEBPVP8 ";

/// Records every invocation instead of spawning processes.
///
/// `cwebp` is simulated by writing `FAKE_WEBP` to its `-o` argument.
#[derive(Default)]
pub struct FakeRunner {
    calls: Mutex<Vec<(String, Vec<String>)>>,
    failing: HashSet<String>,
    unavailable: HashSet<String>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, program: &str) -> Self {
        self.failing.insert(program.to_string());
        self
    }

    pub fn unavailable(mut self, program: &str) -> Self {
        self.unavailable.insert(program.to_string());
        self
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls().into_iter().map(|(program, _)| program).collect()
    }

    /// Invocations of `program` whose arguments mention `path`
    pub fn calls_for(&self, program: &str, path: &Path) -> Vec<Vec<String>> {
        let path = path.to_string_lossy();
        self.calls()
            .into_iter()
            .filter(|(p, args)| p == program && args.iter().any(|a| *a == path))
            .map(|(_, args)| args)
            .collect()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, program: &str, args: &[String]) -> CommandOutput {
        self.calls
            .lock()
            .unwrap()
            .push((program.to_string(), args.to_vec()));

        if self.failing.contains(program) {
            return CommandOutput::exited(
                program,
                Some(1),
                String::new(),
                "simulated failure".to_string(),
                Duration::ZERO,
            );
        }

        if program == "cwebp" {
            if let Some(pos) = args.iter().position(|a| a == "-o") {
                std::fs::write(&args[pos + 1], FAKE_WEBP).unwrap();
            }
        }

        CommandOutput::exited(program, Some(0), String::new(), String::new(), Duration::ZERO)
    }

    fn is_available(&self, program: &str) -> bool {
        !self.unavailable.contains(program)
    }
}

pub fn test_config(root: &Path) -> Config {
    Config {
        upload_root: root.to_path_buf(),
        sweep_enabled: true,
        ..Default::default()
    }
}

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]))
}

pub fn write_jpeg(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    gradient(width, height)
        .save_with_format(&path, image::ImageFormat::Jpeg)
        .unwrap();
    path
}

pub fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    gradient(width, height)
        .save_with_format(&path, image::ImageFormat::Png)
        .unwrap();
    path
}

/// A 1x1 GIF; encoding GIF is not compiled in, so the bytes are written by hand
pub fn write_gif(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(
        &path,
        b"GIF89a\x01\x00\x01\x00\x80\x00\x00\xff\xff\xff\x00\x00\x00!\xf9\x04\x01\x00\x00\x00\x00,\x00\x00\x00\x00\x01\x00\x01\x00\x00\x02\x02D\x01\x00;",
    )
    .unwrap();
    path
}

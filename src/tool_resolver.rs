//! # Tool Path Resolver
//!
//! Finds the external optimizers in the places they are deployed:
//! - a configured tools directory (bundled binaries next to the service)
//! - the `TOOLS_DIR` environment override
//! - the system `PATH`

use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Every external tool the pipeline can invoke, with its role
pub const KNOWN_TOOLS: &[(&str, &str)] = &[
    ("jpegoptim", "JPEG lossy optimization"),
    ("optipng", "PNG lossless optimization"),
    ("pngquant", "PNG palette quantization"),
    ("cwebp", "WebP companion encoding"),
];

/// Tool path resolver for bundled and system-installed tools
#[derive(Debug, Clone, Default)]
pub struct ToolPathResolver {
    /// Directory where tools are bundled
    tools_dir: Option<PathBuf>,
}

impl ToolPathResolver {
    /// Create a resolver; an explicit directory wins over `TOOLS_DIR`
    pub fn new(tools_dir: Option<PathBuf>) -> Self {
        let tools_dir = tools_dir
            .or_else(|| env::var_os("TOOLS_DIR").map(PathBuf::from))
            .filter(|dir| {
                let exists = dir.is_dir();
                if !exists {
                    debug!("Ignoring missing tools directory: {:?}", dir);
                }
                exists
            });

        Self { tools_dir }
    }

    /// Resolve the path to a specific tool, bundled copy first
    pub fn resolve_tool(&self, tool_name: &str) -> Option<PathBuf> {
        if let Some(ref tools_dir) = self.tools_dir {
            if let Some(bundled) = self.find_bundled_tool(tools_dir, tool_name) {
                debug!("Using bundled tool: {} -> {:?}", tool_name, bundled);
                return Some(bundled);
            }
        }

        let system = self.find_in_system_path(tool_name);
        if let Some(ref path) = system {
            debug!("Using system tool: {} -> {:?}", tool_name, path);
        } else {
            debug!("Tool not found: {}", tool_name);
        }
        system
    }

    /// Looks in `<dir>/<tool>` then `<dir>/<platform>/<tool>`
    fn find_bundled_tool(&self, tools_dir: &Path, tool_name: &str) -> Option<PathBuf> {
        let file_name = Self::executable_name(tool_name);
        [
            tools_dir.join(&file_name),
            tools_dir.join(env::consts::OS).join(&file_name),
        ]
        .into_iter()
        .find(|path| path.is_file())
    }

    fn find_in_system_path(&self, tool_name: &str) -> Option<PathBuf> {
        let file_name = Self::executable_name(tool_name);
        let path_var = env::var_os("PATH")?;
        env::split_paths(&path_var)
            .map(|dir| dir.join(&file_name))
            .find(|path| path.is_file())
    }

    fn executable_name(tool_name: &str) -> String {
        if cfg!(windows) {
            format!("{}.exe", tool_name)
        } else {
            tool_name.to_string()
        }
    }

    /// Check if a specific tool is available
    pub fn is_tool_available(&self, tool_name: &str) -> bool {
        self.resolve_tool(tool_name).is_some()
    }

    /// Get installation instructions for a tool on Linux
    fn get_linux_install_instructions(&self, tool_name: &str) -> String {
        match tool_name {
            "cwebp" => "sudo apt-get install webp".to_string(),
            _ => format!("sudo apt-get install {}", tool_name),
        }
    }

    /// Check if a tool is available and provide installation instructions if not
    pub fn check_tool_with_instructions(&self, tool_name: &str) -> Result<PathBuf, String> {
        self.resolve_tool(tool_name).ok_or_else(|| {
            if cfg!(target_os = "linux") {
                format!(
                    "Tool '{}' not found.\nTo install on Linux, run:\n  {}",
                    tool_name,
                    self.get_linux_install_instructions(tool_name)
                )
            } else {
                format!(
                    "Tool '{}' not found. Install it or place it in the tools directory.",
                    tool_name
                )
            }
        })
    }

    /// Get a report of tool availability
    pub fn get_tools_report(&self) -> String {
        let mut report = String::from("Tool availability\n");
        report.push_str(&format!("Bundled tools dir: {:?}\n\n", self.tools_dir));

        for (tool, role) in KNOWN_TOOLS {
            match self.check_tool_with_instructions(tool) {
                Ok(path) => report.push_str(&format!("  ✅ {} ({}) -> {:?}\n", tool, role, path)),
                Err(_) if cfg!(target_os = "linux") => report.push_str(&format!(
                    "  ❌ {} ({}) install with: {}\n",
                    tool,
                    role,
                    self.get_linux_install_instructions(tool)
                )),
                Err(_) => report.push_str(&format!("  ❌ {} ({}) not found\n", tool, role)),
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_bundled_tool_wins() {
        let temp_dir = TempDir::new().unwrap();
        let tool = temp_dir.path().join(ToolPathResolver::executable_name("cwebp"));
        std::fs::write(&tool, b"").unwrap();

        let resolver = ToolPathResolver::new(Some(temp_dir.path().to_path_buf()));
        assert_eq!(resolver.resolve_tool("cwebp"), Some(tool));
    }

    #[test]
    fn test_platform_subfolder_is_searched() {
        let temp_dir = TempDir::new().unwrap();
        let platform_dir = temp_dir.path().join(env::consts::OS);
        std::fs::create_dir_all(&platform_dir).unwrap();
        let tool = platform_dir.join(ToolPathResolver::executable_name("pngquant"));
        std::fs::write(&tool, b"").unwrap();

        let resolver = ToolPathResolver::new(Some(temp_dir.path().to_path_buf()));
        assert_eq!(resolver.resolve_tool("pngquant"), Some(tool));
    }

    #[test]
    fn test_unknown_tool_has_instructions() {
        let resolver = ToolPathResolver::new(None);
        let err = resolver
            .check_tool_with_instructions("definitely-not-a-real-tool-4821")
            .unwrap_err();
        assert!(err.contains("definitely-not-a-real-tool-4821"));
    }

    #[test]
    fn test_report_lists_every_tool() {
        let report = ToolPathResolver::new(None).get_tools_report();
        for (tool, _) in KNOWN_TOOLS {
            assert!(report.contains(tool));
        }
    }
}

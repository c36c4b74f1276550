use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE: &str = "encodex.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    /// Trials drawn from the condition list; `None` runs the whole list
    pub trial_count: Option<usize>,
    pub isi_ms: u64,
    pub feedback_ms: u64,
    pub farewell_ms: u64,
    /// `None` waits for an answer indefinitely
    pub response_timeout_ms: Option<u64>,
    pub seed: Option<u64>,
    pub conditions_path: PathBuf,
    pub image_dir: PathBuf,
    pub output_dir: PathBuf,
    pub output_suffix: String,
    pub abort_key: char,
    pub fullscreen: bool,
    pub font_path: Option<PathBuf>,
    pub text: ScreenText,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            trial_count: Some(5),
            isi_ms: 1000,
            feedback_ms: 1500,
            farewell_ms: 2000,
            response_timeout_ms: None,
            seed: None,
            conditions_path: PathBuf::from("Sub-002_conditions_Study.csv"),
            image_dir: PathBuf::from("Images"),
            output_dir: PathBuf::from("data"),
            output_suffix: "PS6".to_string(),
            abort_key: 'q',
            fullscreen: true,
            font_path: None,
            text: ScreenText::default(),
        }
    }
}

impl StudyConfig {
    pub fn isi(&self) -> Duration {
        Duration::from_millis(self.isi_ms)
    }

    pub fn feedback(&self) -> Duration {
        Duration::from_millis(self.feedback_ms)
    }

    pub fn farewell(&self) -> Duration {
        Duration::from_millis(self.farewell_ms)
    }

    pub fn response_timeout(&self) -> Option<Duration> {
        self.response_timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenText {
    pub welcome: String,
    pub instructions: String,
    pub task: String,
    pub farewell: String,
    pub indoor_feedback: String,
    pub outdoor_feedback: String,
    pub no_response_feedback: String,
}

impl Default for ScreenText {
    fn default() -> Self {
        Self {
            welcome: "Welcome.\n\n\
                      This is the study phase of an incidental encoding task.\n\
                      Trials are sampled at random from a condition list, so every run differs.\n\
                      Responses are not checked for accuracy.\n\n\
                      Press any key to continue"
                .to_string(),
            instructions: "You will see a series of images and are required to make a judgement on them.\n\n\
                           Some of these items will be partially obscured. Do your best to make your judgements!\n\n\
                           Press any key to continue"
                .to_string(),
            task: "For the next set of images, please make the following decision:\n\n\
                   Is the following object typically found indoors or outdoors?\n\n\n\
                   1 - Indoors            2 - Outdoors\n\n\
                   Press any key to continue"
                .to_string(),
            farewell: "Thanks for playing.\n\nIn two seconds this window will close.".to_string(),
            indoor_feedback: "You said indoor".to_string(),
            outdoor_feedback: "You said outdoor".to_string(),
            no_response_feedback: "You pressed nothing".to_string(),
        }
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<StudyConfig> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    serde_yaml::from_str(&raw)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

/// Loads `path` when it exists, otherwise falls back to the defaults.
pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<StudyConfig> {
    let path = path.as_ref();
    if path.exists() {
        log::info!("Using configuration from {}", path.display());
        load_config(path)
    } else {
        log::info!("No {} found, using default configuration", path.display());
        Ok(StudyConfig::default())
    }
}

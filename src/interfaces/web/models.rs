use crate::domain::spectrometer::value_objects::{Measurement, SessionState};
use serde::{Deserialize, Serialize};

/// Response body for the start/stop control endpoints.
///
/// The OctoPrint front end only reads `status`, so this stays a single
/// free-form string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
        }
    }
}

/// Push message sent to observers, one per measurement.
///
/// Fields are independently optional; absent fields are omitted from the
/// JSON so consumers apply partial updates only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PushMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spectrometer_data: Option<Vec<f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_material: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rgb: Option<[u8; 3]>,
}

impl From<&Measurement> for PushMessage {
    fn from(measurement: &Measurement) -> Self {
        Self {
            spectrometer_data: Some(measurement.spectral_samples.clone()),
            predicted_material: measurement.predicted_material.clone(),
            predicted_color: measurement.predicted_color.clone(),
            rgb: measurement.rgb.map(|rgb| rgb.as_array()),
        }
    }
}

/// Current session state for the status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpectrometerStatus {
    pub state: SessionState,
    pub device: String,
    pub observers: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_fault: Option<String>,
}

/// Filament settings with generated temperature G-code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilamentGcodeResponse {
    pub material: String,
    pub print_temp: u16,
    pub bed_temp: u16,
    pub gcode: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub version: String,
    pub build_timestamp: String,
    pub os: String,
    pub arch: String,
    pub uptime_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::spectrometer::value_objects::{Rgb, SpectralFrame};

    #[test]
    fn test_push_message_omits_absent_fields() {
        let measurement = Measurement::from_frame(&SpectralFrame::new(vec![1.0, 2.0, 3.0]))
            .with_material("PLA")
            .with_rgb(Rgb::new(255, 0, 0));

        let json = serde_json::to_value(PushMessage::from(&measurement)).unwrap();
        assert_eq!(json["spectrometer_data"], serde_json::json!([1.0, 2.0, 3.0]));
        assert_eq!(json["predicted_material"], "PLA");
        assert_eq!(json["rgb"], serde_json::json!([255, 0, 0]));
        // predicted_color はキーごと存在しない（部分更新のため）
        assert!(json.get("predicted_color").is_none());
    }

    #[test]
    fn test_push_message_roundtrip() {
        let message = PushMessage {
            spectrometer_data: Some(vec![4.0]),
            predicted_material: None,
            predicted_color: Some("blue".to_string()),
            rgb: None,
        };
        let json = serde_json::to_string(&message).unwrap();
        let parsed: PushMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, message);
    }

    #[test]
    fn test_session_state_serializes_lowercase() {
        let status = SpectrometerStatus {
            state: SessionState::Running,
            device: "simulated-as7265x".to_string(),
            observers: 0,
            last_fault: None,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["state"], "running");
        assert!(json.get("last_fault").is_none());
    }
}

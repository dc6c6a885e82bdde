use serde::Deserialize;

use crate::error::DetectionError;
use crate::models::NormalizedBox;

/// Reply shape the classifier is asked to produce
#[derive(Debug, Deserialize)]
struct DetectorReply {
    boxes: Vec<ReplyBox>,
}

#[derive(Debug, Deserialize)]
struct ReplyBox {
    /// `[ymin, xmin, ymax, xmax]`, 0..=1000
    box_2d: [f64; 4],
    #[serde(default)]
    label: Option<String>,
}

/// Parse a detector reply of the form
/// `{"boxes": [{"box_2d": [ymin, xmin, ymax, xmax], "label": "face"}]}`.
///
/// Schema violations fail the whole reply. Range and ordering are not checked
/// here; see [`crate::models::DetectionSet::from_detector`].
pub fn parse_detection_response(text: &str) -> Result<Vec<NormalizedBox>, DetectionError> {
    if text.trim().is_empty() {
        return Err(DetectionError::EmptyResponse);
    }

    let reply: DetectorReply = serde_json::from_str(text)
        .map_err(|e| DetectionError::MalformedResponse(e.to_string()))?;

    Ok(reply
        .boxes
        .into_iter()
        .map(|b| {
            let [ymin, xmin, ymax, xmax] = b.box_2d;
            NormalizedBox {
                ymin,
                xmin,
                ymax,
                xmax,
                label: b.label,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_boxes_in_order() {
        let text = r#"{"boxes": [
            {"box_2d": [100, 100, 300, 300], "label": "face"},
            {"box_2d": [10.5, 20, 30, 40.25]}
        ]}"#;
        let boxes = parse_detection_response(text).unwrap();
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0], NormalizedBox::new(100.0, 100.0, 300.0, 300.0).with_label("face"));
        assert_eq!(boxes[1], NormalizedBox::new(10.5, 20.0, 30.0, 40.25));
    }

    #[test]
    fn explicit_empty_list_is_success() {
        assert!(parse_detection_response(r#"{"boxes": []}"#).unwrap().is_empty());
    }

    #[test]
    fn blank_body_is_failure() {
        assert!(matches!(
            parse_detection_response("  \n"),
            Err(DetectionError::EmptyResponse)
        ));
    }

    #[test]
    fn schema_violations_are_failures() {
        for text in [
            "not json",
            r#"{}"#,
            r#"{"boxes": [{"label": "face"}]}"#,
            r#"{"boxes": [{"box_2d": [1, 2, 3]}]}"#,
            r#"{"boxes": [{"box_2d": ["a", 2, 3, 4]}]}"#,
            r#"{"boxes": {"box_2d": [1, 2, 3, 4]}}"#,
        ] {
            assert!(
                matches!(
                    parse_detection_response(text),
                    Err(DetectionError::MalformedResponse(_))
                ),
                "expected failure for {}",
                text
            );
        }
    }

    #[test]
    fn out_of_range_values_pass_through_for_later_filtering() {
        let text = r#"{"boxes": [{"box_2d": [900, 0, 100, 1200]}]}"#;
        let boxes = parse_detection_response(text).unwrap();
        assert_eq!(boxes.len(), 1);
        assert!(!boxes[0].is_valid());
    }
}

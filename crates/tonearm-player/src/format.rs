//! Template-driven queue rendering.
//!
//! Substitution is limited to a whitelist of track fields; templates are
//! never evaluated as expressions.

use tonearm_core::Track;

/// Default line template for rendered queues.
pub const DEFAULT_TEMPLATE: &str = "{position}) {title} | {requester}";

/// Placeholders a template may use.
const FIELDS: &[&str] = &[
    "position",
    "title",
    "artist",
    "duration",
    "requester",
    "source",
    "url",
];

/// Render one line per track, replacing `{field}` placeholders. `start` is
/// the zero-based index of the first track in the full queue; displayed
/// positions are one-based.
pub fn render(tracks: &[Track], start: usize, template: &str) -> Vec<String> {
    tracks
        .iter()
        .enumerate()
        .map(|(index, track)| {
            let mut line = template.to_string();
            for field in FIELDS {
                let placeholder = format!("{{{field}}}");
                if !line.contains(&placeholder) {
                    continue;
                }
                let value = match *field {
                    "position" => (start + index + 1).to_string(),
                    "title" => track.title.clone(),
                    "artist" => track.artist_name().to_string(),
                    "duration" => track.duration.format(),
                    "requester" => track.requester.to_string(),
                    "source" => track.source.display_name().to_string(),
                    "url" => track.url.clone(),
                    _ => continue,
                };
                line = line.replace(&placeholder, &value);
            }
            line
        })
        .collect()
}

//! Bookmark CSV export and import.
//!
//! The layout is `name,folder,description,address,coordinates,icon,color`
//! with coordinates written as `"lat, lng"`.

use crate::bookmark::{Bookmark, Icon, MarkerColor, NewBookmark};
use crate::error::CoreError;
use crate::types::Coordinates;

pub const EXPORT_HEADERS: [&str; 7] = [
    "name",
    "folder",
    "description",
    "address",
    "coordinates",
    "icon",
    "color",
];

/// Format coordinates as `"lat, lng"` with six decimals.
pub fn format_coordinates(c: Coordinates) -> String {
    format!("{:.6}, {:.6}", c.lat, c.lng)
}

/// Parse `lat, lng` or `[lat, lng]`.
pub fn parse_coordinates(value: &str) -> Result<Coordinates, CoreError> {
    let inner = value
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim();
    let (lat, lng) = inner.split_once(',').ok_or_else(|| {
        CoreError::Validation(format!("Coordinates '{value}' must be 'lat, lng'"))
    })?;
    let parse = |s: &str| {
        s.trim()
            .parse::<f64>()
            .map_err(|_| CoreError::Validation(format!("Invalid coordinate '{}'", s.trim())))
    };
    Coordinates::new(parse(lat)?, parse(lng)?)
}

/// Serialize bookmarks in the order given.
pub fn export_csv<'a, I>(bookmarks: I) -> Result<String, CoreError>
where
    I: IntoIterator<Item = &'a Bookmark>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    let write_err = |e: csv::Error| CoreError::Internal(format!("CSV write failed: {e}"));

    writer.write_record(EXPORT_HEADERS).map_err(write_err)?;
    for b in bookmarks {
        writer
            .write_record([
                b.name.as_str(),
                b.folder.as_str(),
                b.description.as_str(),
                b.address.as_str(),
                format_coordinates(b.coordinates).as_str(),
                b.icon.as_str(),
                b.color.as_str(),
            ])
            .map_err(write_err)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| CoreError::Internal(format!("CSV flush failed: {e}")))?;
    String::from_utf8(bytes).map_err(|e| CoreError::Internal(e.to_string()))
}

/// Parse an exported file back into bookmark inputs.
///
/// Columns are located by header name; `description`, `address`, `icon`
/// and `color` are optional. Any invalid row fails the whole import with
/// the offending line number.
pub fn import_csv(text: &str) -> Result<Vec<NewBookmark>, CoreError> {
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| CoreError::Validation(format!("Malformed CSV header: {e}")))?
        .clone();
    let col = |name: &str| headers.iter().position(|h| h.trim() == name);
    let name_col = col("name")
        .ok_or_else(|| CoreError::Validation("Missing 'name' column".to_string()))?;
    let coord_col = col("coordinates")
        .ok_or_else(|| CoreError::Validation("Missing 'coordinates' column".to_string()))?;
    let folder_col = col("folder");
    let description_col = col("description");
    let address_col = col("address");
    let icon_col = col("icon");
    let color_col = col("color");

    let mut out = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        // Line 1 is the header.
        let line = idx + 2;
        let record =
            record.map_err(|e| CoreError::Validation(format!("Line {line}: malformed CSV: {e}")))?;
        let field = |c: Option<usize>| c.and_then(|c| record.get(c)).unwrap_or("").trim();
        let at_line = |e: CoreError| match e {
            CoreError::Validation(msg) => CoreError::Validation(format!("Line {line}: {msg}")),
            other => other,
        };

        let name = field(Some(name_col));
        if name.is_empty() {
            return Err(CoreError::Validation(format!("Line {line}: name is empty")));
        }
        let coordinates = parse_coordinates(field(Some(coord_col))).map_err(at_line)?;
        let icon = match field(icon_col) {
            "" => Icon::default(),
            s => Icon::parse(s).map_err(at_line)?,
        };
        let color = match field(color_col) {
            "" => None,
            s => Some(MarkerColor::parse(s).map_err(at_line)?),
        };
        let folder = Some(field(folder_col).to_string()).filter(|f| !f.is_empty());

        out.push(NewBookmark {
            name: name.to_string(),
            folder,
            description: field(description_col).to_string(),
            address: field(address_col).to_string(),
            coordinates,
            icon,
            color,
        });
    }
    Ok(out)
}

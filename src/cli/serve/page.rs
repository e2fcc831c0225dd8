//! The live page served on `GET /`.
//!
//! Images point straight at the render service; the page itself only knows
//! tokens. A `HEAD /` long-poll loop reloads it when the registry changes.
//! Every poll carries the newest `updated_at` the page was rendered from,
//! so a save landing between the page load and the next poll still counts.

use chrono::{DateTime, Utc};

use crate::live::FileEntry;
use crate::render::{Format, render_link};
use crate::utils::date::format_cursor;
use crate::utils::html::escape;

const HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>plantlink</title>
  <meta name="generator" content="plantlink">
</head>
<body onload="checkReload();" style="width:100vw;height:100vh;background-color:lightgrey;">
  <div style="margin:0px 20px;width:100%">
"#;

const SCRIPT_OPEN: &str = "  </div>\n  <script>\n";

const SCRIPT_BODY: &str = r#"    function checkReload() {
      fetch('/', {method: 'HEAD', headers: {'If-Modified-Since': since}})
        .then(response => {
          if (response.status === 200) {
            location.reload();
          } else if (response.status === 304) {
            checkReload();
          } else {
            setTimeout(checkReload, 1000);
          }
        })
        .catch(() => setTimeout(checkReload, 1000));
    }
  </script>
</body>
</html>
"#;

/// Formats shown for every file.
const PAGE_FORMATS: [Format; 2] = [Format::Png, Format::Svg];

/// Render the page for `files` against the render service at `server`.
pub fn render_page(files: &[FileEntry], server: &str) -> String {
    let mut html = String::with_capacity(HEAD.len() + SCRIPT_BODY.len() + files.len() * 512);
    html.push_str(HEAD);

    for file in files {
        html.push_str(&format!("    <h2>{}</h2>\n", escape(&file.display_name)));
        for format in PAGE_FORMATS {
            let link = render_link(server, format, &file.encoded);
            html.push_str(&format!(
                concat!(
                    "    <h3>.{format}</h3>\n",
                    "    Static <a href=\"{link}\">.{format} link</a> from the render service.\n",
                    "    <p>\n",
                    "      <img style=\"object-fit:contain;\" src=\"{link}\" alt=\".{format}\" />\n",
                    "    </p>\n",
                ),
                format = format,
                link = escape(&link),
            ));
        }
    }

    html.push_str(SCRIPT_OPEN);
    html.push_str(&format!(
        "    const since = '{}';\n",
        format_cursor(page_since(files))
    ));
    html.push_str(SCRIPT_BODY);
    html
}

/// Newest update among `files`; the epoch when there are none, so the first
/// file to arrive counts as a change.
fn page_since(files: &[FileEntry]) -> DateTime<Utc> {
    files
        .iter()
        .map(|file| file.updated_at)
        .max()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

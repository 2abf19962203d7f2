// HTML pages and JSON listings for the configuration server.
//
// Every renderer writes into a `fmt::Write` so the firmware can build
// the body in a String (to know Content-Length) and tests can inspect
// the output directly.  Text coming from the outside world (SSIDs, file
// names, request URIs) is escaped on the way out.

use core::fmt::{self, Write};

use crate::http::{Args, Method};
use crate::nvram::{LoggerSettings, SettingsError};
use crate::time::zone::ZONES;

pub const MIN_SAMPLE_NOTICE: &str = "Minimum GPS Sample Time is 1 second - Saved as 1 second.";

/// One row of the Wi-Fi scan shown on the access-point page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkEntry<'a> {
    pub ssid: &'a str,
    pub rssi: i8,
    pub open: bool,
}

/// One log file on the files page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileEntry<'a> {
    pub name: &'a str,
    pub size: u32,
}

/// One row of the `/list` JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListEntry<'a> {
    pub is_dir: bool,
    pub name: &'a str,
}

/// Result of a settings form submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved { raised_to_minimum: bool },
    Rejected(SettingsError),
}

// ── Escaping ────────────────────────────────────────────────────────

struct Html<'a>(&'a str);

impl fmt::Display for Html<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            match c {
                '<' => f.write_str("&lt;")?,
                '>' => f.write_str("&gt;")?,
                '&' => f.write_str("&amp;")?,
                '"' => f.write_str("&quot;")?,
                '\'' => f.write_str("&#39;")?,
                c => f.write_char(c)?,
            }
        }
        Ok(())
    }
}

struct Json<'a>(&'a str);

impl fmt::Display for Json<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            match c {
                '"' => f.write_str("\\\"")?,
                '\\' => f.write_str("\\\\")?,
                '\n' => f.write_str("\\n")?,
                '\r' => f.write_str("\\r")?,
                '\t' => f.write_str("\\t")?,
                c if (c as u32) < 0x20 => write!(f, "\\u{:04x}", c as u32)?,
                c => f.write_char(c)?,
            }
        }
        Ok(())
    }
}

fn open(w: &mut impl Write) -> fmt::Result {
    w.write_str("<!DOCTYPE HTML>\r\n<html>\r\n\r\n")
}

fn close(w: &mut impl Write) -> fmt::Result {
    w.write_str("\r\n\r\n</html>")
}

// ── Root ────────────────────────────────────────────────────────────

/// Root page while serving the access point: scan results and the
/// credential form.
pub fn root_access_point(
    w: &mut impl Write,
    ap_ip: &str,
    networks: &[NetworkEntry<'_>],
) -> fmt::Result {
    open(w)?;
    write!(w, "<h1>You are connected via AP at {}</h1>\r\n", Html(ap_ip))?;
    w.write_str("<h2>Connect to a network to access the internet:</h2>\r\n")?;
    w.write_str("<ul>")?;
    for (i, net) in networks.iter().enumerate() {
        write!(
            w,
            "<li>{}: {} ({}){}</li>",
            i + 1,
            Html(net.ssid),
            net.rssi,
            if net.open { " " } else { "*" }
        )?;
    }
    w.write_str("</ul>\r\n")?;
    w.write_str(
        "<form method='get' action='network'><label>SSID: </label>\
         <input name='ssid' maxlength=32><label> PASSWORD: </label>\
         <input name='pass' maxlength=64>&#9;<input type='submit'></form>\r\n",
    )?;
    w.write_str("<ul>Or go to <a href=\"/files\">files page</a></ul>\r\n")?;
    w.write_str("Go to <a href=\"/settings\">settings</a> page")?;
    close(w)
}

/// Root page once joined to a network as a station.
pub fn root_connected(w: &mut impl Write) -> fmt::Result {
    open(w)?;
    w.write_str("<h1>You are connected</h1>\r\n")?;
    w.write_str("<h2>Go to <a href=\"/files\">files page</a></h2>\r\n")?;
    w.write_str(
        "<h3><a href=\"/cleareeprom\">Disconnect from the network (clear EEPROM memory)</a></h3>\r\n",
    )?;
    w.write_str("Go to <a href=\"/settings\">settings</a> page")?;
    close(w)
}

pub fn network_saved(w: &mut impl Write) -> fmt::Result {
    w.write_str("<h1>Saved to EEPROM... reset to boot into the network</h1>")
}

pub fn eeprom_cleared(w: &mut impl Write) -> fmt::Result {
    w.write_str("<h1>EEPROM Memory is now cleared</h1><h2>Reset to make the change</h2>")
}

// ── Files ───────────────────────────────────────────────────────────

/// Log files in `dir` (e.g. `/GPSLOG`), each with view, download and
/// delete controls.
pub fn files_page(w: &mut impl Write, dir: &str, files: &[FileEntry<'_>]) -> fmt::Result {
    open(w)?;
    w.write_str("<h1>Files:</h1>\r\n")?;
    for file in files {
        let (d, n) = (Html(dir), Html(file.name));
        w.write_str("<ul><li><pre>")?;
        w.write_str("<form action=\"/files\" method=\"get\">")?;
        write!(w, "<a href=\"{d}/{n}\">{n}</a>")?;
        write!(w, " (<a href=\"{d}/{n}?download\" download>download</a>)")?;
        write!(w, "&#9;{} bytes", file.size)?;
        write!(
            w,
            "&#9;<button name=\"delete\" type=\"submit\" value=\"{d}/{n}\">Delete</button>"
        )?;
        w.write_str("</form></pre></li></ul>")?;
    }
    if files.is_empty() {
        write!(
            w,
            "<h2><li>There are no files in \"{}\" directory.</li></h2>\r\n",
            Html(dir)
        )?;
        w.write_str("<h3>Start using GPS logger mode to create new files.</h3>\r\n")?;
    } else {
        w.write_str(
            "<form onsubmit=\"return confirm('Are you sure you want to delete all files?');\">\r\n",
        )?;
        w.write_str("<input type=\"submit\" name=\"deleteAll\" value=\"Delete all\">\r\n")?;
        w.write_str("</form>\r\n")?;
        w.write_str(
            "<p>Go to <a href=\"http://www.gpsvisualizer.com/\">GPS Visualizer</a>: \
             Do-It-Yourself Mapping. Upload a log file to view the route on the map.</p>",
        )?;
    }
    close(w)
}

// ── Settings ────────────────────────────────────────────────────────

/// Settings form pre-filled with `current`, followed by the outcome of
/// a submission when there was one.
pub fn settings_page(
    w: &mut impl Write,
    current: &LoggerSettings,
    outcome: Option<SaveOutcome>,
) -> fmt::Result {
    open(w)?;
    w.write_str("<h1>Settings</h1>")?;
    w.write_str("<form action=\"/settings\" method=\"get\">")?;
    w.write_str("<b>Time Zone: </b><select name=\"TimeZoneOptions\">")?;
    for zone in ZONES.iter() {
        let selected = if zone.offset == current.zone {
            " selected"
        } else {
            ""
        };
        write!(
            w,
            "<option value=\"{0}\"{1}>{0}</option>",
            zone.label, selected
        )?;
    }
    w.write_str("</select>")?;
    w.write_str(
        " (Check: <a href=\"https://www.timeanddate.com/worldclock/\"> World Clock </a>)<br><br>",
    )?;

    let (yes, no) = if current.dst {
        (" checked", "")
    } else {
        ("", " checked")
    };
    w.write_str("<b> DST (Daylight saving time)? </b>")?;
    write!(w, "<input type=\"radio\" name=\"DST\" value=\"Yes\"{yes}> Yes")?;
    write!(w, "<input type=\"radio\" name=\"DST\" value=\"No\"{no}> No<br><br>")?;

    w.write_str("<b>GPS sample time: </b>")?;
    write!(
        w,
        "Minutes: <input type=\"number\" name=\"minutes\" min=\"0\" max=\"60\" value=\"{}\">",
        current.sample.minutes()
    )?;
    write!(
        w,
        " Seconds: <input type=\"number\" name=\"seconds\" min=\"0\" max=\"59\" value=\"{}\"><br><br>",
        current.sample.seconds()
    )?;
    w.write_str("<input type=\"submit\" value=\"Submit\"></form>")?;

    match outcome {
        Some(SaveOutcome::Saved { raised_to_minimum }) => {
            if raised_to_minimum {
                write!(w, "<br>{MIN_SAMPLE_NOTICE}")?;
            }
            w.write_str("<br>Saved!")?;
        }
        Some(SaveOutcome::Rejected(err)) => write!(w, "<br>Not saved: {err}")?,
        None => {}
    }
    close(w)
}

// ── Plain text and JSON ─────────────────────────────────────────────

/// 404 body: what was asked for, echoed back for debugging.
pub fn not_found(w: &mut impl Write, uri: &str, method: Method, args: &Args) -> fmt::Result {
    w.write_str("SDCARD Not Detected\n\n")?;
    write!(w, "URI: {uri}\nMethod: {}\nArguments: {}\n", method.as_str(), args.len())?;
    for (name, value) in args.iter() {
        write!(w, " NAME:{name}\n VALUE:{value}\n")?;
    }
    Ok(())
}

/// `[{"type":"file","name":"A.CSV"},...]`
pub fn list_json<'a>(
    w: &mut impl Write,
    entries: impl IntoIterator<Item = ListEntry<'a>>,
) -> fmt::Result {
    w.write_char('[')?;
    for (i, entry) in entries.into_iter().enumerate() {
        if i > 0 {
            w.write_char(',')?;
        }
        write!(
            w,
            "{{\"type\":\"{}\",\"name\":\"{}\"}}",
            if entry.is_dir { "dir" } else { "file" },
            Json(entry.name)
        )?;
    }
    w.write_char(']')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nvram::SampleInterval;
    use crate::time::ZoneOffset;

    fn render(f: impl FnOnce(&mut String) -> fmt::Result) -> String {
        let mut out = String::new();
        f(&mut out).unwrap();
        out
    }

    #[test]
    fn access_point_root_lists_networks_escaped() {
        let nets = [
            NetworkEntry { ssid: "Home", rssi: -40, open: false },
            NetworkEntry { ssid: "<cafe>", rssi: -71, open: true },
        ];
        let page = render(|w| root_access_point(w, "192.168.4.1", &nets));
        assert!(page.starts_with("<!DOCTYPE HTML>"));
        assert!(page.contains("connected via AP at 192.168.4.1"));
        assert!(page.contains("<li>1: Home (-40)*</li>"));
        assert!(page.contains("<li>2: &lt;cafe&gt; (-71) </li>"));
        assert!(page.contains("action='network'"));
        assert!(page.ends_with("</html>"));
    }

    #[test]
    fn connected_root_offers_disconnect() {
        let page = render(|w| root_connected(w));
        assert!(page.contains("/cleareeprom"));
        assert!(!page.contains("action='network'"));
    }

    #[test]
    fn files_page_with_and_without_files() {
        let files = [FileEntry { name: "24061012.CSV", size: 1234 }];
        let page = render(|w| files_page(w, "/GPSLOG", &files));
        assert!(page.contains("<a href=\"/GPSLOG/24061012.CSV\">24061012.CSV</a>"));
        assert!(page.contains("1234 bytes"));
        assert!(page.contains("value=\"/GPSLOG/24061012.CSV\">Delete"));
        assert!(page.contains("deleteAll"));

        let page = render(|w| files_page(w, "/GPSLOG", &[]));
        assert!(page.contains("There are no files in \"/GPSLOG\" directory."));
        assert!(!page.contains("deleteAll"));
    }

    #[test]
    fn settings_page_reflects_current_values() {
        let current = LoggerSettings {
            zone: ZoneOffset::from_minutes(345),
            dst: true,
            sample: SampleInterval::new(2, 15).unwrap(),
        };
        let page = render(|w| settings_page(w, &current, None));
        assert_eq!(page.matches("<option ").count(), ZONES.len());
        assert_eq!(page.matches(" selected").count(), 1);
        assert!(page.contains("<option value=\"UTC+05:45\" selected>UTC+05:45</option>"));
        assert!(page.contains("value=\"Yes\" checked"));
        assert!(page.contains("name=\"minutes\" min=\"0\" max=\"60\" value=\"2\""));
        assert!(page.contains("name=\"seconds\" min=\"0\" max=\"59\" value=\"15\""));
        assert!(!page.contains("Saved!"));
    }

    #[test]
    fn settings_page_outcomes() {
        let current = LoggerSettings::default();
        let page = render(|w| {
            settings_page(w, &current, Some(SaveOutcome::Saved { raised_to_minimum: true }))
        });
        assert!(page.contains(MIN_SAMPLE_NOTICE));
        assert!(page.contains("<br>Saved!"));
        assert!(page.contains("value=\"No\" checked"));

        let page = render(|w| {
            settings_page(
                w,
                &current,
                Some(SaveOutcome::Rejected(SettingsError::UnknownZone)),
            )
        });
        assert!(page.contains("Not saved: unknown time zone"));
    }

    #[test]
    fn not_found_echoes_request() {
        let args = Args::from_query("a=1&b=two");
        let text = render(|w| not_found(w, "/missing.htm", Method::Get, &args));
        assert_eq!(
            text,
            "SDCARD Not Detected\n\nURI: /missing.htm\nMethod: GET\nArguments: 2\n NAME:a\n VALUE:1\n NAME:b\n VALUE:two\n"
        );
    }

    #[test]
    fn json_listing() {
        let entries = [
            ListEntry { is_dir: true, name: "GPSLOG" },
            ListEntry { is_dir: false, name: "we\"ird\\.txt" },
        ];
        let json = render(|w| list_json(w, entries));
        assert_eq!(
            json,
            r#"[{"type":"dir","name":"GPSLOG"},{"type":"file","name":"we\"ird\\.txt"}]"#
        );
        assert_eq!(render(|w| list_json(w, [])), "[]");
    }
}

// Web mode: configuration and file server on port 80.
//
// Boot joins the stored network (20 polls, 500 ms apart) or falls back
// to an open access point with its own DHCP server.  No embassy tasks
// are spawned: the network runner, the HTTP loop and the DHCP server
// are multiplexed with `select`, so the SD card is only ever touched
// from one place.
//
// Routes:
//   /             root page (network setup or "connected")
//   /network      store Wi-Fi credentials
//   /cleareeprom  forget Wi-Fi credentials
//   /files        list, delete and download log files
//   /settings     zone, DST and sample time
//   /list         directory listing as JSON
//   /edit         DELETE / PUT / POST(multipart) file management
//   anything else is served from the SD card

pub mod dhcp;
pub mod wifi;

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::{self, Write as FmtWrite};

use embassy_futures::select::{Either, Either3, select, select3};
use embassy_net::tcp::{self, TcpSocket};
use embassy_net::{IpListenEndpoint, Stack, StackResources};
use embassy_time::{Duration, Timer, with_timeout};
use embedded_io_async::Write as AsyncWrite;
use esp_radio::wifi::Config;
use gpslog_core::http::multipart::{Event, MultipartScanner};
use gpslog_core::http::{
    self, Args, MAX_HEAD, Method, OCTET_STREAM, RequestHead, Status, TEXT_HTML, TEXT_JSON,
    TEXT_PLAIN,
};
use gpslog_core::logbook::LOG_DIR;
use gpslog_core::nvram::{Nvram, SettingsForm};
use gpslog_core::pages::{self, FileEntry, ListEntry, NetworkEntry, SaveOutcome};
use gpslog_core::provision::{
    AP_ADDRESS, CONNECT_POLL_MS, ProvisionState, Provisioner, write_status,
};
use gpslog_core::{StackFmt, stack_fmt};
use log::{error, info, warn};
use static_cell::StaticCell;

use crate::drivers::sdcard::SdStorage;
use crate::drivers::storage::{self, Name83, Node};
use wifi::ScannedNetwork;

/// Access-point SSID and the name shown in the status text.
pub const HOST: &str = "gpslogger";

const HTTP_PORT: u16 = 80;

// urlencoded bodies beyond this are cut
const FORM_CAP: usize = 1024;

// multipart scanner window; must exceed twice the longest delimiter
const UPLOAD_WINDOW: usize = 512;

// file streaming chunk
const CHUNK: usize = 512;

static STA_RESOURCES: StaticCell<StackResources<4>> = StaticCell::new();
static AP_RESOURCES: StaticCell<StackResources<4>> = StaticCell::new();

/// Everything a request handler may touch.
pub struct WebContext<'a, SPI>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    sd: &'a SdStorage<SPI>,
    nvram: Nvram,
    provisioner: Provisioner,
    networks: Vec<ScannedNetwork>,
}

impl<'a, SPI> WebContext<'a, SPI>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    pub fn new(sd: &'a SdStorage<SPI>) -> Self {
        Self {
            sd,
            nvram: storage::load_nvram(sd),
            provisioner: Provisioner::new(),
            networks: Vec::new(),
        }
    }

    fn save_nvram(&self) -> Result<(), &'static str> {
        storage::save_nvram(self.sd, &self.nvram)
    }
}

// ── Public entry point ──────────────────────────────────────────────

pub async fn run_web_mode<SPI>(sd: &SdStorage<SPI>, wifi_hw: esp_hal::peripherals::WIFI<'static>) -> !
where
    SPI: embedded_hal::spi::SpiDevice,
{
    let mut ctx = WebContext::new(sd);

    let radio = match esp_radio::init() {
        Ok(r) => r,
        Err(e) => {
            error!("wifi: radio init failed: {:?}", e);
            park().await
        }
    };

    let (mut wifi_ctrl, interfaces) = match esp_radio::wifi::new(&radio, wifi_hw, Config::default())
    {
        Ok(pair) => pair,
        Err(e) => {
            error!("wifi: wifi::new failed: {:?}", e);
            park().await
        }
    };

    let seed = {
        let rng = esp_hal::rng::Rng::new();
        (rng.random() as u64) << 32 | rng.random() as u64
    };

    // ── Phase 1: station ───────────────────────────────────────────

    let (ssid, password) = {
        let creds = ctx.nvram.credentials();
        (String::from(creds.ssid), String::from(creds.password))
    };
    ctx.provisioner.begin(!ssid.is_empty());

    let (sta, mut sta_runner) = embassy_net::new(
        interfaces.sta,
        embassy_net::Config::dhcpv4(Default::default()),
        STA_RESOURCES.init(StackResources::new()),
        seed,
    );

    if ctx.provisioner.is_connecting() {
        if let Err(e) = wifi::start_station(&mut wifi_ctrl, &ssid, &password).await {
            warn!("wifi: connect failed: {:?}", e);
        }
        while ctx.provisioner.is_connecting() {
            let poll = with_timeout(
                Duration::from_millis(CONNECT_POLL_MS),
                sta.wait_config_up(),
            );
            let link_up = match select(sta_runner.run(), poll).await {
                Either::First(never) => never,
                Either::Second(r) => r.is_ok(),
            };
            ctx.provisioner.poll(link_up);
        }
    }

    if ctx.provisioner.state() == ProvisionState::Connected {
        let mut ip_buf = [0u8; 16];
        let ip_len = stack_fmt(&mut ip_buf, |w| {
            if let Some(cfg) = sta.config_v4() {
                let _ = write!(w, "{}", cfg.address.address());
            }
        });
        let ip = core::str::from_utf8(&ip_buf[..ip_len]).unwrap_or("?");
        report_status(ctx.provisioner.state(), &ssid, ip);

        match select(sta_runner.run(), serve_forever(&mut ctx, sta)).await {
            Either::First(never) | Either::Second(never) => never,
        }
    }

    // ── Phase 2: access point ──────────────────────────────────────

    if let Err(e) = wifi::start_access_point(&mut wifi_ctrl, HOST).await {
        error!("wifi: access point failed: {:?}", e);
        park().await
    }
    ctx.networks = wifi::scan(&mut wifi_ctrl).await;

    let (ap, mut ap_runner) = embassy_net::new(
        interfaces.ap,
        wifi::access_point_config(),
        AP_RESOURCES.init(StackResources::new()),
        seed,
    );
    report_status(ctx.provisioner.state(), &ssid, "");

    match select3(ap_runner.run(), serve_forever(&mut ctx, ap), dhcp::serve(ap)).await {
        Either3::First(never) | Either3::Second(never) | Either3::Third(never) => never,
    }
}

/// Radio hardware is unusable; keep the executor alive for the logs.
async fn park() -> ! {
    loop {
        Timer::after_secs(1).await;
    }
}

fn report_status(state: ProvisionState, ssid: &str, ip: &str) {
    let mut status = String::new();
    let _ = write_status(&mut status, state, HOST, ssid, ip);
    esp_println::println!("{}", status);
    info!("http: server started");
}

// ── HTTP serving ────────────────────────────────────────────────────

async fn serve_forever<SPI>(ctx: &mut WebContext<'_, SPI>, stack: Stack<'_>) -> !
where
    SPI: embedded_hal::spi::SpiDevice,
{
    let mut rx_buf = [0u8; 1536];
    let mut tx_buf = [0u8; 1536];
    loop {
        serve_one_request(ctx, stack, &mut rx_buf, &mut tx_buf).await;
    }
}

/// Accept one TCP connection on port 80, answer one request, close.
async fn serve_one_request<SPI>(
    ctx: &mut WebContext<'_, SPI>,
    stack: Stack<'_>,
    rx_buf: &mut [u8],
    tx_buf: &mut [u8],
) where
    SPI: embedded_hal::spi::SpiDevice,
{
    let mut socket = TcpSocket::new(stack, rx_buf, tx_buf);
    socket.set_timeout(Some(Duration::from_secs(10)));

    if socket
        .accept(IpListenEndpoint {
            addr: None,
            port: HTTP_PORT,
        })
        .await
        .is_err()
    {
        Timer::after(Duration::from_millis(200)).await;
        return;
    }

    // Read until the blank line that ends the head
    let mut head_buf = [0u8; MAX_HEAD];
    let mut pos = 0usize;
    let result = loop {
        match http::parse_head(&head_buf[..pos]) {
            Ok(head) => break route(ctx, &mut socket, &head, &head_buf[head.head_len..pos]).await,
            Err(http::HttpError::Incomplete) => {}
            Err(e) => {
                warn!("http: {}", e);
                break send(&mut socket, Status::BadRequest, TEXT_PLAIN, &format!("{e}\r\n")).await;
            }
        }
        match socket.read(&mut head_buf[pos..]).await {
            Ok(0) => break Ok(()),
            Ok(n) => pos += n,
            Err(e) => break Err(e),
        }
    };

    if let Err(e) = result {
        warn!("http: connection error: {:?}", e);
    }
    let _ = socket.flush().await;

    Timer::after(Duration::from_millis(50)).await;
    socket.close();
    Timer::after(Duration::from_millis(50)).await;
    socket.abort();
}

async fn route<SPI>(
    ctx: &mut WebContext<'_, SPI>,
    socket: &mut TcpSocket<'_>,
    head: &RequestHead<'_>,
    body_start: &[u8],
) -> Result<(), tcp::Error>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    let path = head.decoded_path();
    info!("http: {} {}", head.method.as_str(), path);

    // uploads stream their body straight to the card
    if head.method == Method::Post && path == "/edit" && head.multipart_boundary().is_some() {
        return handle_upload(ctx, socket, head, body_start).await;
    }

    let mut args = Args::from_query(head.query());
    if head.is_form() && matches!(head.method, Method::Post | Method::Put | Method::Delete) {
        let body = read_form(socket, head, body_start).await?;
        args.extend_encoded(&body);
    }

    match (path.as_str(), head.method) {
        ("/", _) => handle_root(ctx, socket).await,
        ("/network", _) => handle_network(ctx, socket, &args).await,
        ("/cleareeprom", _) => handle_clear(ctx, socket).await,
        ("/files", _) => handle_files(ctx, socket, &args).await,
        ("/settings", _) => handle_settings(ctx, socket, &args).await,
        ("/list", Method::Get) => handle_list(ctx, socket, &args).await,
        ("/edit", Method::Delete) => handle_delete(ctx, socket, &args).await,
        ("/edit", Method::Put) => handle_create(ctx, socket, &args).await,
        ("/edit", Method::Post) => return_ok(socket).await,
        _ => {
            if ctx.sd.is_present() && serve_file(ctx, socket, &path, args.has("download")).await? {
                return Ok(());
            }
            let body = render(|w| pages::not_found(w, &path, head.method, &args));
            info!("http: 404 {}", path);
            send(socket, Status::NotFound, TEXT_PLAIN, &body).await
        }
    }
}

// ── Pages ───────────────────────────────────────────────────────────

async fn handle_root<SPI>(ctx: &WebContext<'_, SPI>, socket: &mut TcpSocket<'_>) -> Result<(), tcp::Error>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    let body = if ctx.provisioner.serves_network_setup() {
        let mut ap_ip = StackFmt::<16>::new();
        let [a, b, c, d] = AP_ADDRESS;
        let _ = write!(ap_ip, "{a}.{b}.{c}.{d}");
        let networks: Vec<NetworkEntry<'_>> = ctx
            .networks
            .iter()
            .map(|n| NetworkEntry {
                ssid: &n.ssid,
                rssi: n.rssi,
                open: n.open,
            })
            .collect();
        render(|w| pages::root_access_point(w, ap_ip.as_str(), &networks))
    } else {
        render(|w| pages::root_connected(w))
    };
    send(socket, Status::Ok, TEXT_HTML, &body).await
}

async fn handle_network<SPI>(
    ctx: &mut WebContext<'_, SPI>,
    socket: &mut TcpSocket<'_>,
    args: &Args,
) -> Result<(), tcp::Error>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    let ssid = args.arg(0).unwrap_or("");
    let password = args.arg(1).unwrap_or("");
    ctx.nvram.store_credentials(ssid, password);
    if let Err(e) = ctx.save_nvram() {
        error!("nvram: {}", e);
        return fail(socket, e).await;
    }
    info!("nvram: credentials stored for '{}'", ctx.nvram.credentials().ssid);
    send(socket, Status::Ok, TEXT_HTML, &render(|w| pages::network_saved(w))).await
}

async fn handle_clear<SPI>(ctx: &mut WebContext<'_, SPI>, socket: &mut TcpSocket<'_>) -> Result<(), tcp::Error>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    ctx.nvram.clear_credentials();
    if let Err(e) = ctx.save_nvram() {
        error!("nvram: {}", e);
        return fail(socket, e).await;
    }
    info!("nvram: credentials cleared");
    send(socket, Status::Ok, TEXT_HTML, &render(|w| pages::eeprom_cleared(w))).await
}

async fn handle_files<SPI>(
    ctx: &mut WebContext<'_, SPI>,
    socket: &mut TcpSocket<'_>,
    args: &Args,
) -> Result<(), tcp::Error>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    let mut dir = StackFmt::<16>::new();
    let _ = write!(dir, "/{}", LOG_DIR);

    match args.name(0) {
        Some("delete") => {
            let target = args.arg(0).unwrap_or("");
            match delete_path(ctx.sd, target) {
                Ok(()) => info!("http: {} deleted", target),
                Err(e) => warn!("http: delete {}: {}", target, e),
            }
        }
        Some("deleteAll") => match storage::delete_all_files(ctx.sd, dir.as_str()) {
            Ok(n) => info!("http: {} files deleted", n),
            Err(e) => warn!("http: delete all: {}", e),
        },
        _ => {}
    }

    let mut files: Vec<(Name83, u32)> = Vec::new();
    let listed = storage::list_dir(ctx.sd, dir.as_str(), |name, is_dir, size| {
        if !is_dir {
            files.push((name83(name), size));
        }
    });
    if let Err(e) = listed {
        info!("http: {}: {}", dir.as_str(), e);
    }

    let entries: Vec<FileEntry<'_>> = files
        .iter()
        .map(|(name, size)| FileEntry {
            name: name.as_str(),
            size: *size,
        })
        .collect();
    let body = render(|w| pages::files_page(w, dir.as_str(), &entries));
    send(socket, Status::Ok, TEXT_HTML, &body).await
}

async fn handle_settings<SPI>(
    ctx: &mut WebContext<'_, SPI>,
    socket: &mut TcpSocket<'_>,
    args: &Args,
) -> Result<(), tcp::Error>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    let mut shown = ctx.nvram.logger_settings();
    let mut outcome = None;

    if args.len() >= 4 {
        let field = |name: &str, i: usize| args.get(name).or(args.arg(i)).unwrap_or("");
        match SettingsForm::parse(
            field("TimeZoneOptions", 0),
            field("DST", 1),
            field("minutes", 2),
            field("seconds", 3),
        ) {
            Ok(form) => {
                ctx.nvram.store_logger_settings(&form.settings);
                if let Err(e) = ctx.save_nvram() {
                    error!("nvram: {}", e);
                    return fail(socket, e).await;
                }
                info!(
                    "nvram: zone {} dst {} sample {}",
                    form.settings.zone, form.settings.dst, form.settings.sample
                );
                shown = form.settings;
                outcome = Some(SaveOutcome::Saved {
                    raised_to_minimum: form.raised_to_minimum,
                });
            }
            Err(e) => {
                warn!("http: settings rejected: {}", e);
                outcome = Some(SaveOutcome::Rejected(e));
            }
        }
    }

    let body = render(|w| pages::settings_page(w, &shown, outcome));
    send(socket, Status::Ok, TEXT_HTML, &body).await
}

// ── File management ─────────────────────────────────────────────────

async fn handle_list<SPI>(
    ctx: &WebContext<'_, SPI>,
    socket: &mut TcpSocket<'_>,
    args: &Args,
) -> Result<(), tcp::Error>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    let Some(dir) = args.get("dir") else {
        return fail(socket, "BAD ARGS").await;
    };
    match storage::stat(ctx.sd, dir) {
        Ok(Some(Node::Dir)) => {}
        Ok(Some(Node::File { .. })) => return fail(socket, "NOT DIR").await,
        _ => return fail(socket, "BAD PATH").await,
    }

    let mut entries: Vec<(Name83, bool)> = Vec::new();
    if let Err(e) = storage::list_dir(ctx.sd, dir, |name, is_dir, _| {
        entries.push((name83(name), is_dir));
    }) {
        return fail(socket, e).await;
    }

    let body = render(|w| {
        pages::list_json(
            w,
            entries.iter().map(|(name, is_dir)| ListEntry {
                is_dir: *is_dir,
                name: name.as_str(),
            }),
        )
    });
    send(socket, Status::Ok, TEXT_JSON, &body).await
}

async fn handle_delete<SPI>(
    ctx: &WebContext<'_, SPI>,
    socket: &mut TcpSocket<'_>,
    args: &Args,
) -> Result<(), tcp::Error>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    let Some(path) = args.arg(0) else {
        return fail(socket, "BAD ARGS").await;
    };
    if path == "/" || !matches!(storage::stat(ctx.sd, path), Ok(Some(_))) {
        return fail(socket, "BAD PATH").await;
    }
    match delete_path(ctx.sd, path) {
        Ok(()) => return_ok(socket).await,
        Err(e) => fail(socket, e).await,
    }
}

async fn handle_create<SPI>(
    ctx: &WebContext<'_, SPI>,
    socket: &mut TcpSocket<'_>,
    args: &Args,
) -> Result<(), tcp::Error>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    let Some(path) = args.arg(0) else {
        return fail(socket, "BAD ARGS").await;
    };
    if path == "/" || !matches!(storage::stat(ctx.sd, path), Ok(None)) {
        return fail(socket, "BAD PATH").await;
    }
    // a dot after the first character means a file
    let created = if path.get(1..).is_some_and(|rest| rest.contains('.')) {
        storage::write_file(ctx.sd, path, &[])
    } else {
        storage::make_dir(ctx.sd, path)
    };
    match created {
        Ok(()) => return_ok(socket).await,
        Err(e) => fail(socket, e).await,
    }
}

/// Files are removed; a directory loses the files inside it but stays,
/// the FAT driver cannot remove directories.
fn delete_path<SPI>(sd: &SdStorage<SPI>, path: &str) -> Result<(), &'static str>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    match storage::stat(sd, path)? {
        Some(Node::File { .. }) => storage::delete_file(sd, path),
        Some(Node::Dir) => storage::delete_all_files(sd, path).map(|_| ()),
        None => Err("not found"),
    }
}

async fn handle_upload<SPI>(
    ctx: &WebContext<'_, SPI>,
    socket: &mut TcpSocket<'_>,
    head: &RequestHead<'_>,
    body_start: &[u8],
) -> Result<(), tcp::Error>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    let boundary = head.multipart_boundary().unwrap_or("");
    let mut scanner = match MultipartScanner::<UPLOAD_WINDOW>::new(boundary) {
        Ok(s) => s,
        Err(e) => {
            warn!("http: upload: {}", e);
            return fail(socket, "BAD ARGS").await;
        }
    };

    let mut upload = Upload {
        target: None,
        written: 0,
    };
    let mut remaining = head.content_length.saturating_sub(body_start.len());
    let mut result = upload.feed(ctx.sd, &mut scanner, body_start);

    let mut chunk = [0u8; CHUNK];
    while result.is_ok() && remaining > 0 && !scanner.is_done() {
        let want = remaining.min(CHUNK);
        let n = socket.read(&mut chunk[..want]).await?;
        if n == 0 {
            break;
        }
        remaining -= n;
        result = upload.feed(ctx.sd, &mut scanner, &chunk[..n]);
    }

    match result.and_then(|()| scanner.finish().map_err(|_| "upload truncated")) {
        Ok(()) => return_ok(socket).await,
        Err(e) => {
            warn!("http: upload: {}", e);
            fail(socket, e).await
        }
    }
}

/// Where the part being received goes, and how much of it arrived.
struct Upload {
    target: Option<String>,
    written: u32,
}

impl Upload {
    fn feed<SPI, const N: usize>(
        &mut self,
        sd: &SdStorage<SPI>,
        scanner: &mut MultipartScanner<N>,
        data: &[u8],
    ) -> Result<(), &'static str>
    where
        SPI: embedded_hal::spi::SpiDevice,
    {
        let mut rest = data;
        loop {
            let taken = scanner.push(rest);
            rest = &rest[taken..];
            while let Some(event) = scanner.poll().map_err(|_| "malformed upload")? {
                match event {
                    Event::Part {
                        filename: Some(name),
                        ..
                    } if !name.is_empty() => {
                        let path = if name.starts_with('/') {
                            String::from(name)
                        } else {
                            format!("/{name}")
                        };
                        // existing files are replaced
                        storage::write_file(sd, &path, &[])?;
                        info!("http: upload start {}", path);
                        self.target = Some(path);
                        self.written = 0;
                    }
                    Event::Part { .. } => self.target = None,
                    Event::Data(bytes) => {
                        if let Some(path) = &self.target {
                            storage::append_file(sd, path, bytes)?;
                            self.written += bytes.len() as u32;
                        }
                    }
                    Event::End => {
                        if let Some(path) = self.target.take() {
                            info!("http: upload end {}, {} bytes", path, self.written);
                        }
                    }
                }
            }
            if rest.is_empty() {
                return Ok(());
            }
        }
    }
}

/// Stream a file from the card.  `Ok(false)` when there is nothing to
/// serve at `path`.
async fn serve_file<SPI>(
    ctx: &WebContext<'_, SPI>,
    socket: &mut TcpSocket<'_>,
    path: &str,
    download: bool,
) -> Result<bool, tcp::Error>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    let mut path = String::from(path);
    if path.ends_with('/') {
        path.push_str("index.htm");
    }
    // NAME.EXT.src shows NAME.EXT as plain text
    let mut ctype = match path.strip_suffix(".src").map(String::from) {
        Some(source) => {
            path = source;
            TEXT_PLAIN
        }
        None => http::content_type(&path),
    };

    let size = match storage::stat(ctx.sd, &path) {
        Ok(Some(Node::File { size })) => size,
        Ok(Some(Node::Dir)) => {
            path.push_str("/index.htm");
            ctype = TEXT_HTML;
            match storage::stat(ctx.sd, &path) {
                Ok(Some(Node::File { size })) => size,
                _ => return Ok(false),
            }
        }
        _ => return Ok(false),
    };
    if download {
        ctype = OCTET_STREAM;
    }

    let mut head = StackFmt::<160>::new();
    let _ = http::write_response_head(&mut head, Status::Ok, ctype, Some(size as usize));
    socket.write_all(head.as_bytes()).await?;

    let mut buf = [0u8; CHUNK];
    let mut offset = 0u32;
    while offset < size {
        let n = match storage::read_chunk(ctx.sd, &path, offset, &mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                warn!("http: {}: {}", path, e);
                break;
            }
        };
        socket.write_all(&buf[..n]).await?;
        offset += n as u32;
    }
    if offset != size {
        warn!("http: sent {} of {} bytes for {}", offset, size, path);
    }
    Ok(true)
}

// ── Response helpers ────────────────────────────────────────────────

fn render(f: impl FnOnce(&mut String) -> fmt::Result) -> String {
    let mut out = String::new();
    let _ = f(&mut out);
    out
}

fn name83(name: &str) -> Name83 {
    let mut n = Name83::new();
    let _ = n.write_str(name);
    n
}

async fn read_form(
    socket: &mut TcpSocket<'_>,
    head: &RequestHead<'_>,
    body_start: &[u8],
) -> Result<String, tcp::Error> {
    let want = head.content_length.min(FORM_CAP);
    let mut body = Vec::with_capacity(want);
    body.extend_from_slice(&body_start[..body_start.len().min(want)]);
    let mut chunk = [0u8; 256];
    while body.len() < want {
        let n = socket.read(&mut chunk[..(want - body.len()).min(256)]).await?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }
    Ok(String::from_utf8_lossy(&body).into_owned())
}

async fn send(
    socket: &mut TcpSocket<'_>,
    status: Status,
    content_type: &str,
    body: &str,
) -> Result<(), tcp::Error> {
    let mut head = StackFmt::<160>::new();
    let _ = http::write_response_head(&mut head, status, content_type, Some(body.len()));
    socket.write_all(head.as_bytes()).await?;
    socket.write_all(body.as_bytes()).await
}

async fn return_ok(socket: &mut TcpSocket<'_>) -> Result<(), tcp::Error> {
    send(socket, Status::Ok, TEXT_PLAIN, "").await
}

async fn fail(socket: &mut TcpSocket<'_>, msg: &str) -> Result<(), tcp::Error> {
    send(socket, Status::InternalError, TEXT_PLAIN, &format!("{msg}\r\n")).await
}

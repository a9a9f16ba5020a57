mod api;

use api::ApiClient;
use gloo_file::File as GlooFile;
use gloo_timers::callback::Timeout;
use shared::{
    overlay_rect, Detection, FlowEvent, ImageRecord, ImageStatus, PaginatedResponse, RetryPolicy,
    UploadFlow, DEFAULT_PAGE_SIZE,
};
use uuid::Uuid;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Event, HtmlImageElement, HtmlInputElement, HtmlSelectElement, InputEvent};
use yew::prelude::*;

// Pages
#[derive(Clone, Copy, PartialEq, Eq)]
enum Page {
    Upload,
    Images,
    ImageDetail(Uuid),
    Detections,
}

// Yew msg components
enum Msg {
    Navigate(Page),

    // Upload flow
    FileChosen(Option<GlooFile>),
    SetAnalyzeAfterUpload(bool),
    Submit,
    UploadFinished(Result<ImageRecord, String>),
    AnalyzeFinished(Result<Vec<Detection>, String>),
    ResetUpload,

    // Image listing
    ImagesLoaded(Result<PaginatedResponse<ImageRecord>, String>),
    GoToImagesPage(u32),
    StatusFilterChanged(String),
    FilenameFilterInput(String),
    CommitFilenameFilter,
    ReloadImages,
    DeleteImage(Uuid),
    ImageDeleted(Result<(), String>),

    // Image detail
    DetailLoaded(Result<(ImageRecord, Vec<Detection>), String>),
    NaturalSize(u32, u32),
    AnalyzeRequested(Uuid),
    DetailAnalyzeFinished(Result<Vec<Detection>, String>),

    // Detection listing
    DetectionsLoaded(Result<PaginatedResponse<Detection>, String>),
    GoToDetectionsPage(u32),
    LabelFilterInput(String),
    MinConfidenceInput(String),
    ApplyDetectionFilters,
    ReloadDetections,
}

// Main component
struct Model {
    page: Page,
    api: ApiClient,

    // Upload page
    flow: UploadFlow,
    selected_file: Option<GlooFile>,
    analyze_after_upload: bool,
    uploaded: Option<ImageRecord>,
    upload_error: Option<String>,

    // Image listing
    images: Option<PaginatedResponse<ImageRecord>>,
    images_page: u32,
    status_filter: String,
    filename_input: String,
    filename_filter: String,
    images_loading: bool,
    images_error: Option<String>,
    filter_debounce: Option<Timeout>,

    // Image detail
    detail: Option<(ImageRecord, Vec<Detection>)>,
    detail_loading: bool,
    detail_error: Option<String>,
    natural_size: Option<(u32, u32)>,

    // Detection listing
    detections: Option<PaginatedResponse<Detection>>,
    detections_page: u32,
    label_input: String,
    min_confidence_input: String,
    detections_loading: bool,
    detections_error: Option<String>,
}

// Helper functions
fn format_file_size(bytes: i64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = 1024.0 * 1024.0;
    let size = bytes as f64;
    if size >= MIB {
        format!("{:.1} MiB", size / MIB)
    } else if size >= KIB {
        format!("{:.1} KiB", size / KIB)
    } else {
        format!("{bytes} B")
    }
}

fn render_pager<T>(data: &PaginatedResponse<T>, noun: &str, go: Callback<u32>) -> Html {
    if data.total == 0 && !data.has_previous {
        return html! {};
    }

    let current = data.page;
    let prev = {
        let go = go.clone();
        Callback::from(move |_: MouseEvent| go.emit(current - 1))
    };
    let next = Callback::from(move |_: MouseEvent| go.emit(current + 1));

    html! {
        <div class="pager">
            <button class="pager-btn" onclick={prev} disabled={!data.has_previous}>
                <i class="fa-solid fa-chevron-left"></i>{" Previous"}
            </button>
            <span class="pager-status">
                { format!("Page {} of {} ({} {})", data.page, data.pages, data.total, noun) }
            </span>
            <button class="pager-btn" onclick={next} disabled={!data.has_next}>
                {"Next "}<i class="fa-solid fa-chevron-right"></i>
            </button>
        </div>
    }
}

// Yew component implementation
impl Component for Model {
    type Message = Msg;
    type Properties = ();

    fn create(_ctx: &Context<Self>) -> Self {
        Self {
            page: Page::Upload,
            api: ApiClient::new("", RetryPolicy::default()),

            flow: UploadFlow::Idle,
            selected_file: None,
            analyze_after_upload: true,
            uploaded: None,
            upload_error: None,

            images: None,
            images_page: 1,
            status_filter: String::new(),
            filename_input: String::new(),
            filename_filter: String::new(),
            images_loading: false,
            images_error: None,
            filter_debounce: None,

            detail: None,
            detail_loading: false,
            detail_error: None,
            natural_size: None,

            detections: None,
            detections_page: 1,
            label_input: String::new(),
            min_confidence_input: String::new(),
            detections_loading: false,
            detections_error: None,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::Navigate(page) => self.handle_navigate(ctx, page),

            // Upload flow
            Msg::FileChosen(file) => {
                self.selected_file = file;
                true
            }
            Msg::SetAnalyzeAfterUpload(analyze) => {
                self.analyze_after_upload = analyze;
                true
            }
            Msg::Submit => self.handle_submit(ctx),
            Msg::UploadFinished(result) => self.handle_upload_finished(ctx, result),
            Msg::AnalyzeFinished(result) => self.handle_analyze_finished(result),
            Msg::ResetUpload => self.handle_reset_upload(),

            // Image listing
            Msg::ImagesLoaded(result) => self.handle_images_loaded(result),
            Msg::GoToImagesPage(page) => {
                self.images_page = page;
                self.fetch_images(ctx);
                true
            }
            Msg::StatusFilterChanged(status) => {
                self.status_filter = status;
                self.images_page = 1;
                self.fetch_images(ctx);
                true
            }
            Msg::FilenameFilterInput(value) => self.handle_filename_filter_input(ctx, value),
            Msg::CommitFilenameFilter => self.handle_commit_filename_filter(ctx),
            Msg::ReloadImages => {
                self.fetch_images(ctx);
                true
            }
            Msg::DeleteImage(id) => self.handle_delete_image(ctx, id),
            Msg::ImageDeleted(result) => self.handle_image_deleted(ctx, result),

            // Image detail
            Msg::DetailLoaded(result) => self.handle_detail_loaded(result),
            Msg::NaturalSize(width, height) => {
                self.natural_size = Some((width, height));
                true
            }
            Msg::AnalyzeRequested(id) => self.handle_analyze_requested(ctx, id),
            Msg::DetailAnalyzeFinished(result) => self.handle_detail_analyze_finished(ctx, result),

            // Detection listing
            Msg::DetectionsLoaded(result) => self.handle_detections_loaded(result),
            Msg::GoToDetectionsPage(page) => {
                self.detections_page = page;
                self.fetch_detections(ctx);
                true
            }
            Msg::LabelFilterInput(value) => {
                self.label_input = value;
                true
            }
            Msg::MinConfidenceInput(value) => {
                self.min_confidence_input = value;
                true
            }
            Msg::ApplyDetectionFilters => {
                self.detections_page = 1;
                self.fetch_detections(ctx);
                true
            }
            Msg::ReloadDetections => {
                self.fetch_detections(ctx);
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        html! {
            <div class="container">
                { self.render_header(ctx) }

                <main class="main-content">
                {
                    match self.page {
                        Page::Upload => self.render_upload_page(ctx),
                        Page::Images => self.render_images_page(ctx),
                        Page::ImageDetail(id) => self.render_detail_page(ctx, id),
                        Page::Detections => self.render_detections_page(ctx),
                    }
                }
                </main>

                <footer class="app-footer">
                    <p>{"Object Detection Gallery | Fullstack Rust WASM"}</p>
                </footer>
            </div>
        }
    }
}

// Handler methods
impl Model {
    fn handle_navigate(&mut self, ctx: &Context<Self>, page: Page) -> bool {
        self.page = page;
        match page {
            Page::Upload => {}
            Page::Images => self.fetch_images(ctx),
            Page::ImageDetail(id) => self.fetch_detail(ctx, id),
            Page::Detections => self.fetch_detections(ctx),
        }
        true
    }

    fn handle_submit(&mut self, ctx: &Context<Self>) -> bool {
        let Some(file) = self.selected_file.clone() else {
            return false;
        };
        if !self.flow.can_submit(true) {
            return false;
        }

        self.flow = self.flow.advance(FlowEvent::Submit {
            analyze: self.analyze_after_upload,
        });
        self.uploaded = None;
        self.upload_error = None;

        let api = self.api.clone();
        let link = ctx.link().clone();
        spawn_local(async move {
            let result = api.upload_image(&file).await;
            link.send_message(Msg::UploadFinished(result));
        });
        true
    }

    fn handle_upload_finished(
        &mut self,
        ctx: &Context<Self>,
        result: Result<ImageRecord, String>,
    ) -> bool {
        match result {
            Ok(record) => {
                self.flow = self.flow.advance(FlowEvent::UploadOk);
                let id = record.id;
                self.uploaded = Some(record);

                if self.flow == UploadFlow::Analyzing {
                    let api = self.api.clone();
                    let link = ctx.link().clone();
                    spawn_local(async move {
                        let result = api.analyze_image(id).await;
                        link.send_message(Msg::AnalyzeFinished(result));
                    });
                } else {
                    self.selected_file = None;
                }
            }
            Err(message) => {
                self.flow = self.flow.advance(FlowEvent::UploadErr);
                self.upload_error = Some(message);
            }
        }
        true
    }

    fn handle_analyze_finished(&mut self, result: Result<Vec<Detection>, String>) -> bool {
        match result {
            Ok(detections) => {
                self.flow = self.flow.advance(FlowEvent::AnalyzeOk);
                self.selected_file = None;
                if let Some(record) = &mut self.uploaded {
                    record.status = ImageStatus::Completed;
                }
                log::info!("analysis finished with {} detections", detections.len());
            }
            Err(message) => {
                self.flow = self.flow.advance(FlowEvent::AnalyzeErr);
                self.upload_error = Some(message);
            }
        }
        true
    }

    fn handle_reset_upload(&mut self) -> bool {
        self.flow = self.flow.advance(FlowEvent::Reset);
        self.selected_file = None;
        self.uploaded = None;
        self.upload_error = None;
        true
    }

    fn handle_images_loaded(
        &mut self,
        result: Result<PaginatedResponse<ImageRecord>, String>,
    ) -> bool {
        self.images_loading = false;
        match result {
            Ok(page) => {
                self.images = Some(page);
                self.images_error = None;
            }
            // Keep whatever was on screen; the banner offers a retry.
            Err(message) => self.images_error = Some(message),
        }
        true
    }

    fn handle_filename_filter_input(&mut self, ctx: &Context<Self>, value: String) -> bool {
        self.filename_input = value;

        if let Some(timeout) = self.filter_debounce.take() {
            timeout.cancel();
        }
        let link = ctx.link().clone();
        self.filter_debounce = Some(Timeout::new(400, move || {
            link.send_message(Msg::CommitFilenameFilter);
        }));
        true
    }

    fn handle_commit_filename_filter(&mut self, ctx: &Context<Self>) -> bool {
        self.filter_debounce = None;
        if self.filename_filter != self.filename_input {
            self.filename_filter = self.filename_input.clone();
            self.images_page = 1;
            self.fetch_images(ctx);
        }
        true
    }

    fn handle_delete_image(&mut self, ctx: &Context<Self>, id: Uuid) -> bool {
        let api = self.api.clone();
        let link = ctx.link().clone();
        spawn_local(async move {
            let result = api.delete_image(id).await;
            link.send_message(Msg::ImageDeleted(result));
        });
        false
    }

    fn handle_image_deleted(&mut self, ctx: &Context<Self>, result: Result<(), String>) -> bool {
        match result {
            Ok(()) => {
                if matches!(self.page, Page::ImageDetail(_)) {
                    return self.handle_navigate(ctx, Page::Images);
                }
                // Step back when the page just lost its only row.
                if let Some(page) = &self.images {
                    if page.items.len() <= 1 && self.images_page > 1 {
                        self.images_page -= 1;
                    }
                }
                self.fetch_images(ctx);
            }
            Err(message) => {
                if matches!(self.page, Page::ImageDetail(_)) {
                    self.detail_error = Some(message);
                } else {
                    self.images_error = Some(message);
                }
            }
        }
        true
    }

    fn handle_detail_loaded(
        &mut self,
        result: Result<(ImageRecord, Vec<Detection>), String>,
    ) -> bool {
        self.detail_loading = false;
        match result {
            Ok((record, detections)) => {
                // Drop answers for an image the user already navigated away from.
                if self.page == Page::ImageDetail(record.id) {
                    self.detail = Some((record, detections));
                }
            }
            Err(message) => self.detail_error = Some(message),
        }
        true
    }

    fn handle_analyze_requested(&mut self, ctx: &Context<Self>, id: Uuid) -> bool {
        if self.detail_loading {
            return false;
        }
        self.detail_loading = true;
        self.detail_error = None;

        let api = self.api.clone();
        let link = ctx.link().clone();
        spawn_local(async move {
            let result = api.analyze_image(id).await;
            link.send_message(Msg::DetailAnalyzeFinished(result));
        });
        true
    }

    fn handle_detail_analyze_finished(
        &mut self,
        ctx: &Context<Self>,
        result: Result<Vec<Detection>, String>,
    ) -> bool {
        match result {
            Ok(_) => {
                if let Page::ImageDetail(id) = self.page {
                    self.fetch_detail(ctx, id);
                }
            }
            Err(message) => {
                self.detail_loading = false;
                self.detail_error = Some(message);
            }
        }
        true
    }

    fn handle_detections_loaded(
        &mut self,
        result: Result<PaginatedResponse<Detection>, String>,
    ) -> bool {
        self.detections_loading = false;
        match result {
            Ok(page) => {
                self.detections = Some(page);
                self.detections_error = None;
            }
            Err(message) => self.detections_error = Some(message),
        }
        true
    }

    // Fetch helpers
    fn fetch_images(&mut self, ctx: &Context<Self>) {
        self.images_loading = true;
        self.images_error = None;

        let api = self.api.clone();
        let page = self.images_page;
        let status = (!self.status_filter.is_empty()).then(|| self.status_filter.clone());
        let filename = {
            let needle = self.filename_filter.trim();
            (!needle.is_empty()).then(|| needle.to_string())
        };
        let link = ctx.link().clone();
        spawn_local(async move {
            let result = api
                .list_images(page, DEFAULT_PAGE_SIZE, status.as_deref(), filename.as_deref())
                .await;
            link.send_message(Msg::ImagesLoaded(result));
        });
    }

    fn fetch_detail(&mut self, ctx: &Context<Self>, id: Uuid) {
        // Only blank the view when switching to a different image; a
        // refresh of the same one keeps the current render in place.
        if self.detail.as_ref().map(|(record, _)| record.id) != Some(id) {
            self.detail = None;
            self.natural_size = None;
        }
        self.detail_loading = true;
        self.detail_error = None;

        let api = self.api.clone();
        let link = ctx.link().clone();
        spawn_local(async move {
            let result = match api.get_image(id).await {
                Ok(record) => match api.image_detections(id).await {
                    Ok(detections) => Ok((record, detections)),
                    Err(message) => Err(message),
                },
                Err(message) => Err(message),
            };
            link.send_message(Msg::DetailLoaded(result));
        });
    }

    fn fetch_detections(&mut self, ctx: &Context<Self>) {
        let min_confidence = match self.parsed_min_confidence() {
            Ok(value) => value,
            Err(message) => {
                self.detections_error = Some(message);
                return;
            }
        };

        self.detections_loading = true;
        self.detections_error = None;

        let api = self.api.clone();
        let page = self.detections_page;
        let label = {
            let label = self.label_input.trim();
            (!label.is_empty()).then(|| label.to_string())
        };
        let link = ctx.link().clone();
        spawn_local(async move {
            let result = api
                .list_detections(page, DEFAULT_PAGE_SIZE, label.as_deref(), min_confidence)
                .await;
            link.send_message(Msg::DetectionsLoaded(result));
        });
    }

    fn parsed_min_confidence(&self) -> Result<Option<f64>, String> {
        let raw = self.min_confidence_input.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse::<f64>()
            .map(Some)
            .map_err(|_| format!("minimum confidence \"{raw}\" is not a number"))
    }
}

// Rendering methods
impl Model {
    fn render_header(&self, ctx: &Context<Self>) -> Html {
        let link = ctx.link();
        let images_active = matches!(self.page, Page::Images | Page::ImageDetail(_));

        html! {
            <header class="app-header">
                <h1><i class="fa-solid fa-object-group"></i>{" Object Detection Gallery"}</h1>
                <nav class="tab-bar">
                    <button
                        class={classes!("tab-btn", (self.page == Page::Upload).then_some("active"))}
                        onclick={link.callback(|_| Msg::Navigate(Page::Upload))}
                    >
                        <i class="fa-solid fa-upload"></i>{" Upload"}
                    </button>
                    <button
                        class={classes!("tab-btn", images_active.then_some("active"))}
                        onclick={link.callback(|_| Msg::Navigate(Page::Images))}
                    >
                        <i class="fa-solid fa-images"></i>{" Images"}
                    </button>
                    <button
                        class={classes!("tab-btn", (self.page == Page::Detections).then_some("active"))}
                        onclick={link.callback(|_| Msg::Navigate(Page::Detections))}
                    >
                        <i class="fa-solid fa-crosshairs"></i>{" Detections"}
                    </button>
                </nav>
            </header>
        }
    }

    fn render_upload_page(&self, ctx: &Context<Self>) -> Html {
        let link = ctx.link();

        let handle_change = link.callback(|e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            let file = input
                .files()
                .and_then(|list| list.item(0))
                .map(GlooFile::from);
            input.set_value("");
            Msg::FileChosen(file)
        });

        let handle_analyze_toggle = link.callback(|e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            Msg::SetAnalyzeAfterUpload(input.checked())
        });

        let trigger_file_input = Callback::from(|_: MouseEvent| {
            if let Some(input) = web_sys::window()
                .and_then(|w| w.document())
                .and_then(|d| d.get_element_by_id("file-input"))
            {
                if let Ok(html_input) = input.dyn_into::<web_sys::HtmlElement>() {
                    html_input.click();
                }
            }
        });

        html! {
            <div class="upload-section">
                <input
                    type="file"
                    id="file-input"
                    accept=".jpg,.jpeg,.png,.webp"
                    style="display: none;"
                    onchange={handle_change}
                />

                <div class="upload-area" onclick={trigger_file_input}>
                    <div class="upload-placeholder">
                        <i class="fa-solid fa-cloud-arrow-up"></i>
                        <p>{"Click to choose an image"}</p>
                        <p class="file-types">{"Supported formats: JPG, JPEG, PNG, WEBP"}</p>
                    </div>
                </div>

                { self.render_chosen_file() }

                <label class="analyze-toggle">
                    <input
                        type="checkbox"
                        checked={self.analyze_after_upload}
                        onchange={handle_analyze_toggle}
                        disabled={self.flow.in_flight()}
                    />
                    {" Run object detection right after the upload"}
                </label>

                <div class="button-container">
                    <button
                        class="analyze-btn"
                        onclick={link.callback(|_| Msg::Submit)}
                        disabled={!self.flow.can_submit(self.selected_file.is_some())}
                    >
                        { self.render_submit_button_content() }
                    </button>
                    <button
                        class="analyze-btn secondary"
                        onclick={link.callback(|_| Msg::ResetUpload)}
                        disabled={self.flow.in_flight() || self.flow == UploadFlow::Idle}
                    >
                        <i class="fa-solid fa-rotate-left"></i>{" Reset"}
                    </button>
                </div>

                { self.render_upload_outcome(ctx) }
            </div>
        }
    }

    fn render_chosen_file(&self) -> Html {
        match &self.selected_file {
            Some(file) => html! {
                <p class="chosen-file">
                    <i class="fa-solid fa-file-image"></i>
                    { format!(" {} ({})", file.name(), format_file_size(file.size() as i64)) }
                </p>
            },
            None => html! { <p class="chosen-file muted">{"No file chosen yet."}</p> },
        }
    }

    fn render_submit_button_content(&self) -> Html {
        if self.flow.in_flight() {
            html! { <><i class="fa-solid fa-spinner fa-spin"></i>{ format!(" {}...", self.flow) }</> }
        } else {
            html! { <><i class="fa-solid fa-upload"></i>{" Upload"}</> }
        }
    }

    fn render_upload_outcome(&self, ctx: &Context<Self>) -> Html {
        let link = ctx.link();

        match self.flow {
            UploadFlow::Done => {
                if let Some(record) = &self.uploaded {
                    let id = record.id;
                    html! {
                        <div class="upload-outcome success">
                            <p>
                                <i class="fa-solid fa-circle-check"></i>
                                { format!(" \"{}\" uploaded ({}, status: {})",
                                    record.filename,
                                    format_file_size(record.file_size),
                                    record.status) }
                            </p>
                            <button
                                class="analyze-btn"
                                onclick={link.callback(move |_| Msg::Navigate(Page::ImageDetail(id)))}
                            >
                                <i class="fa-solid fa-eye"></i>{" View details"}
                            </button>
                        </div>
                    }
                } else {
                    html! {}
                }
            }
            UploadFlow::Failed => html! {
                <div class="error-message">
                    <i class="fa-solid fa-circle-exclamation"></i>
                    <p>{ self.upload_error.clone().unwrap_or_else(|| "Upload failed.".to_string()) }</p>
                    <p class="muted">{"The form is still filled in; fix the file and submit again."}</p>
                </div>
            },
            _ => html! {},
        }
    }

    fn render_images_page(&self, ctx: &Context<Self>) -> Html {
        let link = ctx.link();

        let handle_status = link.callback(|e: Event| {
            let select: HtmlSelectElement = e.target_unchecked_into();
            Msg::StatusFilterChanged(select.value())
        });
        let handle_filename = link.callback(|e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            Msg::FilenameFilterInput(input.value())
        });

        html! {
            <div class="list-section">
                <div class="filter-bar">
                    <select class="filter-select" onchange={handle_status}>
                        <option value="" selected={self.status_filter.is_empty()}>{"All statuses"}</option>
                        { for ImageStatus::ALL.iter().map(|status| {
                            let value = status.to_string();
                            html! {
                                <option value={value.clone()} selected={self.status_filter == value}>
                                    { value.clone() }
                                </option>
                            }
                        })}
                    </select>
                    <input
                        class="filter-input"
                        type="text"
                        placeholder="Filter by filename..."
                        value={self.filename_input.clone()}
                        oninput={handle_filename}
                    />
                    { if self.images_loading {
                        html! { <i class="fa-solid fa-spinner fa-spin"></i> }
                    } else {
                        html! {}
                    }}
                </div>

                { self.render_fetch_error(&self.images_error, link.callback(|_| Msg::ReloadImages)) }
                { self.render_images_table(ctx) }
            </div>
        }
    }

    fn render_fetch_error(&self, error: &Option<String>, retry: Callback<MouseEvent>) -> Html {
        if let Some(message) = error {
            html! {
                <div class="error-message">
                    <i class="fa-solid fa-circle-exclamation"></i>
                    <p>{ message.clone() }</p>
                    <button class="analyze-btn" onclick={retry}>
                        <i class="fa-solid fa-rotate-right"></i>{" Retry"}
                    </button>
                </div>
            }
        } else {
            html! {}
        }
    }

    fn render_images_table(&self, ctx: &Context<Self>) -> Html {
        let Some(data) = &self.images else {
            return if self.images_loading {
                html! { <p class="muted">{"Loading images..."}</p> }
            } else {
                html! {}
            };
        };

        if data.items.is_empty() {
            let text = if data.total == 0 {
                "No images match the current filters."
            } else {
                "This page is empty; use Previous to get back to the data."
            };
            return html! {
                <>
                    <p class="muted">{ text }</p>
                    { render_pager(data, "images", ctx.link().callback(Msg::GoToImagesPage)) }
                </>
            };
        }

        html! {
            <>
                <table class="data-table">
                    <thead>
                        <tr>
                            <th>{"Filename"}</th>
                            <th>{"Status"}</th>
                            <th>{"Size"}</th>
                            <th>{"Uploaded"}</th>
                            <th>{"Actions"}</th>
                        </tr>
                    </thead>
                    <tbody>
                        { for data.items.iter().map(|record| self.render_image_row(ctx, record)) }
                    </tbody>
                </table>
                { render_pager(data, "images", ctx.link().callback(Msg::GoToImagesPage)) }
            </>
        }
    }

    fn render_image_row(&self, ctx: &Context<Self>, record: &ImageRecord) -> Html {
        let link = ctx.link();
        let id = record.id;

        html! {
            <tr key={id.to_string()}>
                <td class="filename-cell" title={record.storage_path.clone()}>{ &record.filename }</td>
                <td>{ Self::render_status_badge(record.status) }</td>
                <td>{ format_file_size(record.file_size) }</td>
                <td>{ record.upload_timestamp.format("%Y-%m-%d %H:%M:%S").to_string() }</td>
                <td class="actions-cell">
                    <button
                        class="row-btn"
                        title="View detections for this image"
                        onclick={link.callback(move |_| Msg::Navigate(Page::ImageDetail(id)))}
                    >
                        <i class="fa-solid fa-eye"></i>
                    </button>
                    <button
                        class="row-btn danger"
                        title="Delete this image and its detections"
                        onclick={link.callback(move |_| Msg::DeleteImage(id))}
                    >
                        <i class="fa-solid fa-trash"></i>
                    </button>
                </td>
            </tr>
        }
    }

    fn render_status_badge(status: ImageStatus) -> Html {
        let label = status.to_string();
        html! { <span class={classes!("status-badge", format!("status-{label}"))}>{ label.clone() }</span> }
    }

    fn render_detail_page(&self, ctx: &Context<Self>, id: Uuid) -> Html {
        let link = ctx.link();

        let back = html! {
            <button class="analyze-btn secondary" onclick={link.callback(|_| Msg::Navigate(Page::Images))}>
                <i class="fa-solid fa-arrow-left"></i>{" Back to images"}
            </button>
        };

        let Some((record, detections)) = &self.detail else {
            return html! {
                <div class="detail-section">
                    { back }
                    { self.render_fetch_error(&self.detail_error, link.callback(move |_| Msg::Navigate(Page::ImageDetail(id)))) }
                    { if self.detail_loading {
                        html! { <p class="muted">{"Loading image..."}</p> }
                    } else {
                        html! {}
                    }}
                </div>
            };
        };

        let onload = link.callback(|e: Event| {
            let img: HtmlImageElement = e.target_unchecked_into();
            Msg::NaturalSize(img.natural_width(), img.natural_height())
        });

        html! {
            <div class="detail-section">
                { back }
                { self.render_fetch_error(&self.detail_error, link.callback(move |_| Msg::Navigate(Page::ImageDetail(id)))) }

                <div class="detail-layout">
                    <div class="image-pane" style="position: relative; display: inline-block;">
                        <img
                            src={self.api.image_file_url(record.id)}
                            alt={record.filename.clone()}
                            style="max-width: 100%; display: block;"
                            onload={onload}
                        />
                        { self.render_overlays(detections) }
                    </div>

                    <div class="meta-pane">
                        <h2>{ &record.filename }</h2>
                        <p>{"Status: "}{ Self::render_status_badge(record.status) }</p>
                        <p>{ format!("Size: {}", format_file_size(record.file_size)) }</p>
                        <p>{ format!("Uploaded: {}", record.upload_timestamp.format("%Y-%m-%d %H:%M:%S")) }</p>
                        { match self.natural_size {
                            Some((width, height)) => html! { <p>{ format!("Dimensions: {width} x {height} px") }</p> },
                            None => html! {},
                        }}
                        <p class="muted">{ record.id.to_string() }</p>

                        <div class="button-container">
                            <button
                                class="analyze-btn"
                                onclick={link.callback(move |_| Msg::AnalyzeRequested(id))}
                                disabled={self.detail_loading}
                            >
                                { if self.detail_loading {
                                    html! { <><i class="fa-solid fa-spinner fa-spin"></i>{" Working..."}</> }
                                } else {
                                    html! { <><i class="fa-solid fa-magnifying-glass"></i>{" Analyze"}</> }
                                }}
                            </button>
                            <button
                                class="analyze-btn danger"
                                onclick={link.callback(move |_| Msg::DeleteImage(id))}
                            >
                                <i class="fa-solid fa-trash"></i>{" Delete"}
                            </button>
                        </div>
                    </div>
                </div>

                { self.render_detail_detections(detections) }
            </div>
        }
    }

    fn render_overlays(&self, detections: &[Detection]) -> Html {
        // No boxes until the image reports its natural dimensions.
        let Some((width, height)) = self.natural_size else {
            return html! {};
        };

        detections
            .iter()
            .filter_map(|detection| {
                overlay_rect(&detection.bbox(), width, height).map(|rect| {
                    html! {
                        <div
                            key={detection.id.to_string()}
                            class="bbox-overlay"
                            style={format!("position: absolute; {}; border: 2px solid var(--primary-color); box-sizing: border-box;", rect.css())}
                        >
                            <span
                                class="bbox-label"
                                style="position: absolute; top: 0; left: 0; background: var(--primary-color); color: #fff; font-size: 11px; padding: 0 3px;"
                            >
                                { format!("{} {:.0}%", detection.label, detection.confidence_score * 100.0) }
                            </span>
                        </div>
                    }
                })
            })
            .collect::<Html>()
    }

    fn render_detail_detections(&self, detections: &[Detection]) -> Html {
        if detections.is_empty() {
            return html! {
                <p class="muted">{"No detections yet. Run the analysis to find objects in this image."}</p>
            };
        }

        html! {
            <div class="detections-list">
                <h3>{ format!("Detections ({})", detections.len()) }</h3>
                <table class="data-table">
                    <thead>
                        <tr>
                            <th>{"Label"}</th>
                            <th>{"Confidence"}</th>
                            <th>{"Box (xmin, ymin, xmax, ymax)"}</th>
                        </tr>
                    </thead>
                    <tbody>
                        { for detections.iter().map(Self::render_detection_row) }
                    </tbody>
                </table>
            </div>
        }
    }

    fn render_detection_row(detection: &Detection) -> Html {
        html! {
            <tr key={detection.id.to_string()}>
                <td>{ &detection.label }</td>
                <td>{ Self::render_confidence_meter(detection.confidence_score) }</td>
                <td class="muted">
                    { format!("({}, {}, {}, {})",
                        detection.bbox_xmin, detection.bbox_ymin,
                        detection.bbox_xmax, detection.bbox_ymax) }
                </td>
            </tr>
        }
    }

    fn render_confidence_meter(score: f64) -> Html {
        let percentage = score * 100.0;
        html! {
            <div class="confidence-meter">
                <div class="meter">
                    <div class="meter-fill" style={format!("width: {percentage}%")}></div>
                </div>
                <div class="meter-value">{ format!("{percentage:.1}%") }</div>
            </div>
        }
    }

    fn render_detections_page(&self, ctx: &Context<Self>) -> Html {
        let link = ctx.link();

        let handle_label = link.callback(|e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            Msg::LabelFilterInput(input.value())
        });
        let handle_min_confidence = link.callback(|e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            Msg::MinConfidenceInput(input.value())
        });

        html! {
            <div class="list-section">
                <div class="filter-bar">
                    <input
                        class="filter-input"
                        type="text"
                        placeholder="Filter by label..."
                        value={self.label_input.clone()}
                        oninput={handle_label}
                    />
                    <input
                        class="filter-input"
                        type="number"
                        min="0"
                        max="1"
                        step="0.05"
                        placeholder="Min confidence (0..1)"
                        value={self.min_confidence_input.clone()}
                        oninput={handle_min_confidence}
                    />
                    <button class="analyze-btn" onclick={link.callback(|_| Msg::ApplyDetectionFilters)}>
                        <i class="fa-solid fa-filter"></i>{" Apply"}
                    </button>
                    { if self.detections_loading {
                        html! { <i class="fa-solid fa-spinner fa-spin"></i> }
                    } else {
                        html! {}
                    }}
                </div>

                { self.render_fetch_error(&self.detections_error, link.callback(|_| Msg::ReloadDetections)) }
                { self.render_detections_table(ctx) }
            </div>
        }
    }

    fn render_detections_table(&self, ctx: &Context<Self>) -> Html {
        let Some(data) = &self.detections else {
            return if self.detections_loading {
                html! { <p class="muted">{"Loading detections..."}</p> }
            } else {
                html! { <p class="muted">{"Press Apply to load detections."}</p> }
            };
        };

        if data.items.is_empty() {
            let text = if data.total == 0 {
                "No detections match the current filters."
            } else {
                "This page is empty; use Previous to get back to the data."
            };
            return html! {
                <>
                    <p class="muted">{ text }</p>
                    { render_pager(data, "detections", ctx.link().callback(Msg::GoToDetectionsPage)) }
                </>
            };
        }

        html! {
            <>
                <table class="data-table">
                    <thead>
                        <tr>
                            <th>{"Label"}</th>
                            <th>{"Confidence"}</th>
                            <th>{"Detected"}</th>
                            <th>{"Image"}</th>
                        </tr>
                    </thead>
                    <tbody>
                        { for data.items.iter().map(|detection| self.render_detections_row(ctx, detection)) }
                    </tbody>
                </table>
                { render_pager(data, "detections", ctx.link().callback(Msg::GoToDetectionsPage)) }
            </>
        }
    }

    fn render_detections_row(&self, ctx: &Context<Self>, detection: &Detection) -> Html {
        let link = ctx.link();
        let image_id = detection.image_id;

        html! {
            <tr key={detection.id.to_string()}>
                <td>{ &detection.label }</td>
                <td>{ Self::render_confidence_meter(detection.confidence_score) }</td>
                <td>{ detection.created_at.format("%Y-%m-%d %H:%M:%S").to_string() }</td>
                <td>
                    <button
                        class="row-btn"
                        title="Open the image this detection belongs to"
                        onclick={link.callback(move |_| Msg::Navigate(Page::ImageDetail(image_id)))}
                    >
                        <i class="fa-solid fa-image"></i>{" View"}
                    </button>
                </td>
            </tr>
        }
    }
}

fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("App starting...");
    yew::Renderer::<Model>::new().render();
}

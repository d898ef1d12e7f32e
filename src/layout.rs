use super::chain::FilterChain;
use super::compose::side_by_side;
use super::custom::CustomFilter;
use super::filter::*;
use base64::{engine::general_purpose::STANDARD, Engine};
use gloo::file::{
    callbacks::{read_as_bytes, FileReader},
    File,
};
use std::collections::HashMap;
use wasm_bindgen::{prelude::*, Clamped};
use web_sys::{
    CanvasRenderingContext2d, Event, FileList, HtmlCanvasElement, HtmlImageElement,
    HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement, ImageData,
};
use yew::prelude::*;

#[allow(unused)]
macro_rules! log {
    ( $( $t:tt )* ) => {
        web_sys::console::log_1(&format!( $( $t )* ).into())
    }
}

pub const CUSTOM_EXAMPLE: &str = r#"{
  "name": "sepia",
  "color_matrix": [
    [0.3588, 0.7044, 0.1368, 0.0],
    [0.2990, 0.5870, 0.1140, 0.0],
    [0.2392, 0.4696, 0.0912, 0.0],
    [0.0, 0.0, 0.0, 1.0]
  ]
}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Kind {
    #[default]
    Sobel,
    Pixellate,
    Grayscale,
    Custom,
    /// Pixellation feeding the custom filter.
    Chain,
}

impl Kind {
    const ALL: [(Kind, &'static str, &'static str); 5] = [
        (Kind::Sobel, "sobel", "Sobel Edge Detection"),
        (Kind::Pixellate, "pixellate", "Pixellate"),
        (Kind::Grayscale, "grayscale", "Grayscale"),
        (Kind::Custom, "custom", "Custom"),
        (Kind::Chain, "chain", "Pixellate -> Custom"),
    ];

    fn id(self) -> &'static str {
        Self::ALL
            .iter()
            .find(|(kind, _, _)| *kind == self)
            .map(|(_, id, _)| *id)
            .unwrap_or("sobel")
    }

    fn from_id(id: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .find(|(_, kind_id, _)| *kind_id == id)
            .map(|(kind, _, _)| *kind)
    }
}

pub enum Msg {
    Filter,
    Files(Option<FileList>),
    Loaded(String, String, Vec<u8>),
    Select(String),
    OnEdit(String, String),
}

#[derive(Default)]
pub struct App {
    kind: Kind,
    edge_strength: f32,
    fractional_width_of_a_pixel: f32,
    custom_source: String,
    status: String,

    image_element: NodeRef,
    origin_canvas: NodeRef,
    target_canvas: NodeRef,
    compare_canvas: NodeRef,
    readers: HashMap<String, FileReader>,
}

impl App {
    fn build_filter(&self) -> Result<Box<dyn Filter>, crate::Error> {
        Ok(match self.kind {
            Kind::Sobel => Box::new(SobelEdgeDetection::new(self.edge_strength)),
            Kind::Pixellate => Box::new(Pixellate::new(self.fractional_width_of_a_pixel)),
            Kind::Grayscale => Box::new(Grayscale),
            Kind::Custom => Box::new(self.custom_source.parse::<CustomFilter>()?),
            Kind::Chain => {
                let custom = self.custom_source.parse::<CustomFilter>()?;
                let mut chain = FilterChain::new();
                chain
                    .add_target(Pixellate::new(self.fractional_width_of_a_pixel))
                    .add_target(custom);
                Box::new(chain)
            }
        })
    }
}

fn context_2d(canvas: &HtmlCanvasElement) -> CanvasRenderingContext2d {
    canvas
        .get_context("2d")
        .unwrap()
        .unwrap()
        .dyn_into::<CanvasRenderingContext2d>()
        .unwrap()
}

/// An `<img>` without a decoded source reports a natural size of zero, and
/// reading zero-sized image data from a canvas throws.
fn loaded_size(width: u32, height: u32) -> Option<(u32, u32)> {
    (width > 0 && height > 0).then_some((width, height))
}

fn draw(canvas: &HtmlCanvasElement, image: &RgbaImage) {
    let clamped_buf: Clamped<&[u8]> = Clamped(image.as_raw());
    let image_data =
        ImageData::new_with_u8_clamped_array_and_sh(clamped_buf, image.width(), image.height())
            .unwrap();
    canvas.set_width(image.width());
    canvas.set_height(image.height());
    context_2d(canvas).put_image_data(&image_data, 0.0, 0.0).unwrap();
}

impl Component for App {
    type Message = Msg;
    type Properties = ();

    fn create(_ctx: &Context<Self>) -> Self {
        Self {
            edge_strength: EDGE_STRENGTH,
            fractional_width_of_a_pixel: FRACTIONAL_WIDTH_OF_A_PIXEL,
            custom_source: CUSTOM_EXAMPLE.to_string(),
            ..Default::default()
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::Loaded(file_name, file_type, data) => {
                let image_element = self.image_element.cast::<HtmlImageElement>().unwrap();

                image_element.set_src(&format!(
                    "data:{};base64,{}",
                    file_type,
                    STANDARD.encode(&data)
                ));
                self.readers.remove(&file_name);
                true
            }
            Msg::Files(files) => {
                if let Some(files) = files {
                    let files = js_sys::try_iter(&files)
                        .unwrap()
                        .unwrap()
                        .map(|v| web_sys::File::from(v.unwrap()))
                        .map(File::from)
                        .collect::<Vec<_>>();

                    if let Some(file) = files.first().cloned() {
                        let link = ctx.link().clone();
                        self.readers.insert(
                            file.name(),
                            read_as_bytes(&file.clone(), move |res| match res {
                                Ok(data) => link.send_message(Msg::Loaded(
                                    file.name(),
                                    file.raw_mime_type(),
                                    data,
                                )),
                                Err(err) => log!("failed to read {}: {}", file.name(), err),
                            }),
                        );
                    }
                }
                true
            }
            Msg::Filter => {
                let origin_canvas = self.origin_canvas.cast::<HtmlCanvasElement>().unwrap();
                let origin_context = context_2d(&origin_canvas);
                let image_element = self.image_element.cast::<HtmlImageElement>().unwrap();
                let Some((width, height)) =
                    loaded_size(image_element.natural_width(), image_element.natural_height())
                else {
                    self.status = "no image loaded".to_string();
                    return true;
                };

                origin_canvas.set_width(width);
                origin_canvas.set_height(height);
                origin_context
                    .draw_image_with_html_image_element(&image_element, 0.0, 0.0)
                    .unwrap();

                let data = origin_context
                    .get_image_data(0.0, 0.0, width as f64, height as f64)
                    .unwrap();
                let Some(source) = RgbaImage::from_raw(width, height, data.data().0) else {
                    self.status = "canvas returned a short pixel buffer".to_string();
                    return true;
                };

                let filter = match self.build_filter() {
                    Ok(filter) => filter,
                    Err(err) => {
                        self.status = err.to_string();
                        return true;
                    }
                };
                match filter.image_by_filtering(&source) {
                    Some(filtered) => {
                        draw(&self.target_canvas.cast::<HtmlCanvasElement>().unwrap(), &filtered);
                        draw(
                            &self.compare_canvas.cast::<HtmlCanvasElement>().unwrap(),
                            &side_by_side(&source, &filtered),
                        );
                        self.status = format!("applied {}", filter.name());
                    }
                    None => self.status = format!("{} produced no output", filter.name()),
                }
                log!("{}", self.status);
                true
            }
            Msg::Select(id) => {
                if let Some(kind) = Kind::from_id(&id) {
                    self.kind = kind;
                }
                true
            }
            Msg::OnEdit(id, value) => {
                match id.as_str() {
                    "edge_strength" => match value.parse() {
                        Ok(v) => self.edge_strength = v,
                        Err(_) => log!("not a number: {}", value),
                    },
                    "pixel_width" => match value.parse() {
                        Ok(v) => self.fractional_width_of_a_pixel = v,
                        Err(_) => log!("not a number: {}", value),
                    },
                    "custom" => self.custom_source = value,
                    _ => {}
                }
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let on_range = ctx.link().callback(|e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            Msg::OnEdit(input.id(), input.value())
        });

        html! {
            <section class="image-display">
              <div class="origin">
                <label>{"Original Image"}</label>
                <img id="img" width="224px" crossorigin="anonymous"
                  ref={self.image_element.clone()} />
                <input
                  id="img-input"
                  type="file"
                  accept="image/png, image/jpeg"
                  onchange={ctx.link().callback(|e: Event| {
                    let input: HtmlInputElement = e.target_unchecked_into();
                    Msg::Files(input.files())
                  })}
                />
              </div>

              <div id="origin-container">
                <label>{"Original Canvas"}</label>
                <canvas id="origin-canvas" width="224" ref={self.origin_canvas.clone()}></canvas>
                <div>
                    <select
                        id="filter"
                        onchange={ctx.link().callback(|e: Event| {
                            let select: HtmlSelectElement = e.target_unchecked_into();
                            Msg::Select(select.value())
                        })}>
                        { for Kind::ALL.iter().map(|(kind, id, label)| html! {
                            <option value={*id} selected={*kind == self.kind}>{ *label }</option>
                        }) }
                    </select>
                    <button onclick={ctx.link().callback(|_| Msg::Filter)}>{ "Filter" }</button>
                </div>
              </div>

              <div class="detected">
                <label>{"Filtered Canvas"}</label>
                <canvas id="canvas" width="224" ref={self.target_canvas.clone()}></canvas>
              </div>

              <div class="compare">
                <label>{"Side by Side"}</label>
                <canvas id="compare-canvas" width="448" ref={self.compare_canvas.clone()}></canvas>
              </div>

              <div>
                <p>{ format!("Filter: {}", self.kind.id()) }</p>
                <label for="edge_strength">{ "Edge Strength" }</label>
                <input
                    type="range"
                    min="0"
                    max="4"
                    step="any"
                    id="edge_strength"
                    value={ format!("{}", &self.edge_strength) }
                    onchange={on_range.clone()}
                    />

                <label for="pixel_width">{ "Fractional Width of a Pixel" }</label>
                <input
                    type="range"
                    min="0"
                    max="0.3"
                    step="any"
                    id="pixel_width"
                    value={ format!("{}", &self.fractional_width_of_a_pixel) }
                    onchange={on_range}
                    />

                <label for="custom">{ "Custom Filter" }</label>
                <textarea
                    id="custom"
                    rows="10"
                    cols="48"
                    value={ self.custom_source.clone() }
                    onchange={ctx.link().callback(|e: Event| {
                        let input: HtmlTextAreaElement = e.target_unchecked_into();
                        Msg::OnEdit(input.id(), input.value())
                    })}
                    />

                <p>{ &self.status }</p>
              </div>
            </section>
        }
    }
}

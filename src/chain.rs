use crate::filter::{Filter, RgbaImage};

/// Filters connected output-to-input.
///
/// ```no_run
/// use filter_playground::chain::FilterChain;
/// use filter_playground::filter::{Grayscale, Pixellate};
///
/// let pixellate = Pixellate::new(0.02);
/// let mut chain = FilterChain::new();
/// chain.add_target(&pixellate).add_target(Grayscale);
/// let source = image::open("ChairTest.png").unwrap().to_rgba8();
/// let result = chain.process_image(&source);
/// ```
#[derive(Default)]
pub struct FilterChain<'a> {
    name: String,
    targets: Vec<Box<dyn Filter + 'a>>,
}

impl<'a> FilterChain<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `filter`, fed by the output of the current last stage.
    pub fn add_target(&mut self, filter: impl Filter + 'a) -> &mut Self {
        if !self.name.is_empty() {
            self.name.push_str(" -> ");
        }
        self.name.push_str(filter.name());
        self.targets.push(Box::new(filter));
        self
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Runs `source` through every stage and captures the last output.
    ///
    /// An empty chain passes the source through. Any stage producing no
    /// output ends the chain without output.
    pub fn process_image(&self, source: &RgbaImage) -> Option<RgbaImage> {
        let mut current = source.clone();
        for target in &self.targets {
            match target.image_by_filtering(&current) {
                Some(next) => current = next,
                None => {
                    log::debug!("chain stage `{}` produced no output", target.name());
                    return None;
                }
            }
        }
        Some(current)
    }
}

impl Filter for FilterChain<'_> {
    fn name(&self) -> &str {
        if self.name.is_empty() {
            "passthrough"
        } else {
            &self.name
        }
    }

    fn image_by_filtering(&self, image: &RgbaImage) -> Option<RgbaImage> {
        self.process_image(image)
    }
}

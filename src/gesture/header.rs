/// Development builds may show the cosmetic tap counter next to the title.
pub const DEBUG_TAP_INDICATOR: bool = cfg!(feature = "debug-tap-indicator");

/// What the header surface shows. The title is passed through untouched.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HeaderModel<'a> {
    title: &'a str,
    tap_indicator: Option<u8>,
}

impl<'a> HeaderModel<'a> {
    pub fn new(title: &'a str, display_counter: u8) -> Self {
        Self {
            title,
            tap_indicator: (DEBUG_TAP_INDICATOR && display_counter > 0).then_some(display_counter),
        }
    }

    pub fn title(&self) -> &'a str {
        self.title
    }

    pub fn tap_indicator(&self) -> Option<u8> {
        self.tap_indicator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_passes_through() {
        let model = HeaderModel::new("Contatos", 0);
        assert_eq!(model.title(), "Contatos");
        assert_eq!(model.tap_indicator(), None);
    }

    #[test]
    fn indicator_follows_debug_feature() {
        let model = HeaderModel::new("Contatos", 3);
        assert_eq!(model.tap_indicator(), DEBUG_TAP_INDICATOR.then_some(3));
    }
}

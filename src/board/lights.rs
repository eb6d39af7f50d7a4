use log::warn;
use std::collections::BTreeMap;

use super::notation::Square;
use crate::hardware::{LedColor, LedDriver, LedError, LedTarget};

/// What a lit square is telling the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightRole {
    LegalDestination,
    GuideStart,
    GuideEnd,
    Error,
}

impl LightRole {
    pub fn color(self) -> LedColor {
        match self {
            LightRole::LegalDestination => LedColor::Cyan,
            LightRole::GuideStart | LightRole::GuideEnd => LedColor::Green,
            LightRole::Error => LedColor::Red,
        }
    }
}

/// Translates highlight requests into LED driver calls.
///
/// Driver failures are logged and otherwise ignored; a dark LED never stops
/// the game.
pub struct LightFeedback {
    driver: Box<dyn LedDriver>,
    lit: BTreeMap<Square, LightRole>,
}

impl LightFeedback {
    pub fn new(driver: Box<dyn LedDriver>) -> Self {
        LightFeedback {
            driver,
            lit: BTreeMap::new(),
        }
    }

    pub fn highlight<I>(&mut self, squares: I, role: LightRole)
    where
        I: IntoIterator<Item = Square>,
    {
        let mut result: Result<(), LedError> = Ok(());
        for square in squares {
            self.lit.insert(square, role);
            result = result.and(self.driver.set(LedTarget::Square(square), role.color()));
        }
        if let Err(e) = result.and_then(|_| self.driver.show()) {
            warn!("Failed to update lights: {}", e);
        }
    }

    pub fn clear(&mut self) {
        self.lit.clear();
        if let Err(e) = self
            .driver
            .set(LedTarget::All, LedColor::Off)
            .and_then(|_| self.driver.show())
        {
            warn!("Failed to clear lights: {}", e);
        }
    }

    pub fn role_of(&self, square: Square) -> Option<LightRole> {
        self.lit.get(&square).copied()
    }

    pub fn is_dark(&self) -> bool {
        self.lit.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::RecordingLedDriver;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn test_roles_map_to_palette() {
        assert_eq!(LightRole::LegalDestination.color(), LedColor::Cyan);
        assert_eq!(LightRole::GuideStart.color(), LedColor::Green);
        assert_eq!(LightRole::GuideEnd.color(), LedColor::Green);
        assert_eq!(LightRole::Error.color(), LedColor::Red);
    }

    #[test]
    fn test_highlight_then_clear() {
        let driver = RecordingLedDriver::new();
        let mut lights = LightFeedback::new(Box::new(driver.clone()));

        lights.highlight([sq("e3"), sq("e4")], LightRole::LegalDestination);
        assert_eq!(driver.lit_with(LedColor::Cyan), vec![sq("e3"), sq("e4")]);
        assert_eq!(lights.role_of(sq("e4")), Some(LightRole::LegalDestination));

        lights.clear();
        assert!(lights.is_dark());
        assert!(driver.is_dark());
        assert_eq!(driver.writes().last(), Some(&(LedTarget::All, LedColor::Off)));
    }

    struct BrokenDriver;

    impl LedDriver for BrokenDriver {
        fn set(&mut self, _: LedTarget, _: LedColor) -> Result<(), LedError> {
            Err(LedError::WriteFailed("strip unplugged".to_string()))
        }
    }

    #[test]
    fn test_driver_failure_is_not_fatal() {
        let mut lights = LightFeedback::new(Box::new(BrokenDriver));
        lights.highlight([sq("a1")], LightRole::Error);
        assert_eq!(lights.role_of(sq("a1")), Some(LightRole::Error));
        lights.clear();
        assert!(lights.is_dark());
    }
}

use std::{
    fmt::Debug,
    ops::{Deref, DerefMut},
};

use crate::context::Context;
use async_trait::async_trait;
use eyre::Result;
use model::rights::{Rights, Rule};
use teloxide::types::Message;

#[async_trait]
pub trait View {
    fn name(&self) -> &'static str;

    fn main_view(&self) -> bool {
        false
    }

    /// Right a user must hold to open this screen. Checked by the handlers
    /// before the screen sees any update.
    fn required_rule(&self) -> Option<Rule> {
        None
    }

    async fn show(&mut self, ctx: &mut Context) -> Result<(), eyre::Error>;

    async fn handle_message(
        &mut self,
        ctx: &mut Context,
        msg: &Message,
    ) -> Result<Jmp, eyre::Error> {
        ctx.delete_msg(msg.id).await?;
        Ok(Jmp::Stay)
    }

    async fn handle_callback(&mut self, _: &mut Context, _: &str) -> Result<Jmp, eyre::Error> {
        Ok(Jmp::Stay)
    }

    fn widget(self) -> Widget
    where
        Self: Sized + Send + Sync + 'static,
    {
        Widget {
            view: Box::new(self),
            back: None,
        }
    }
}

pub struct Widget {
    view: Box<dyn View + Send + Sync + 'static>,
    back: Option<Box<Widget>>,
}

impl Widget {
    pub fn set_back(&mut self, back: Widget) {
        self.back = Some(Box::new(back));
    }

    pub fn take_back(&mut self) -> Option<Widget> {
        self.back.take().map(|b| *b)
    }

    /// Whether a user holding `rights` may open this screen.
    pub fn is_allowed(&self, rights: &Rights) -> bool {
        self.view
            .required_rule()
            .map_or(true, |rule| rights.has_rule(rule))
    }

    /// The main menu is always one tap away, so it gets no back button.
    pub(crate) fn can_go_back(&self) -> bool {
        self.back.as_ref().map_or(false, |b| !b.view.main_view())
    }
}

impl<T: View + Send + Sync + 'static> From<T> for Widget {
    fn from(value: T) -> Self {
        value.widget()
    }
}

impl Deref for Widget {
    type Target = Box<dyn View + Send + Sync + 'static>;

    fn deref(&self) -> &Self::Target {
        &self.view
    }
}

impl DerefMut for Widget {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.view
    }
}

impl Debug for Widget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -> [{}]",
            self.view.name(),
            self.back.as_ref().map(|w| w.name()).unwrap_or("?")
        )
    }
}

pub enum Jmp {
    /// Open a screen on top of the current one.
    Next(Widget),
    /// Replace the whole stack.
    Goto(Widget),
    Stay,
    Back,
    Home,
    /// The update was not meant for this screen.
    None,
}

impl<T: View + Send + Sync + 'static> From<T> for Jmp {
    fn from(value: T) -> Self {
        Jmp::Next(value.into())
    }
}

impl From<Widget> for Jmp {
    fn from(value: Widget) -> Self {
        Jmp::Next(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Menu;

    #[async_trait]
    impl View for Menu {
        fn name(&self) -> &'static str {
            "Menu"
        }

        fn main_view(&self) -> bool {
            true
        }

        async fn show(&mut self, _: &mut Context) -> Result<(), eyre::Error> {
            Ok(())
        }
    }

    struct Stats;

    #[async_trait]
    impl View for Stats {
        fn name(&self) -> &'static str {
            "Stats"
        }

        fn required_rule(&self) -> Option<Rule> {
            Some(Rule::ViewStatistics)
        }

        async fn show(&mut self, _: &mut Context) -> Result<(), eyre::Error> {
            Ok(())
        }
    }

    #[test]
    fn test_required_rule() {
        assert!(Menu.widget().is_allowed(&Rights::customer()));
        assert!(!Stats.widget().is_allowed(&Rights::customer()));
        assert!(Stats.widget().is_allowed(&Rights::full()));
    }

    #[test]
    fn test_back_button() {
        let mut stats = Stats.widget();
        assert!(!stats.can_go_back());
        stats.set_back(Menu.widget());
        assert!(!stats.can_go_back());

        let mut nested = Stats.widget();
        nested.set_back(stats);
        assert!(nested.can_go_back());
        assert_eq!(format!("{:?}", nested), "Stats -> [Stats]");
        assert_eq!(nested.take_back().map(|w| w.name()), Some("Stats"));
    }
}

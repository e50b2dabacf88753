/// Selectable component: pick state of a node.

use crate::declare_capability;
use crate::scene::{shared, Shared};

pub trait SelectableComponent {
    fn is_selected(&self) -> bool;
    fn set_selected(&mut self, selected: bool);

    fn toggle(&mut self) {
        let selected = self.is_selected();
        self.set_selected(!selected);
    }
}

declare_capability!(dyn SelectableComponent, "SelectableComponent");

#[derive(Debug, Default)]
pub struct Selectable {
    selected: bool,
}

impl SelectableComponent for Selectable {
    fn is_selected(&self) -> bool {
        self.selected
    }

    fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }
}

pub struct SelectableComponentFactory;

impl SelectableComponentFactory {
    pub fn create() -> Shared<dyn SelectableComponent> {
        shared(Selectable::default())
    }
}

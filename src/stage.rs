//! The window-equivalent that views mount into.
//!
//! A [`Stage`] knows the current output size, keeps the resize listeners
//! registered by mounted views and tracks which outputs are attached to it.

pub type ResizeCallback = Box<dyn FnMut(u32, u32)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputId(u64);

pub struct Stage {
    width: u32,
    height: u32,
    listeners: Vec<(ListenerId, ResizeCallback)>,
    outputs: Vec<(OutputId, String)>,
    next_id: u64,
}

impl Stage {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            listeners: Vec::new(),
            outputs: Vec::new(),
            next_id: 1,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn add_resize_listener(&mut self, callback: ResizeCallback) -> ListenerId {
        let id = ListenerId(self.next_id());
        self.listeners.push((id, callback));
        id
    }

    /// Returns false if the listener was not registered.
    pub fn remove_resize_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn resize_listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Records the new size and notifies every listener.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        log::debug!("Stage resized to {}x{}", width, height);

        for (_, callback) in self.listeners.iter_mut() {
            callback(width, height);
        }
    }

    pub fn attach_output(&mut self, label: impl Into<String>) -> OutputId {
        let id = OutputId(self.next_id());
        self.outputs.push((id, label.into()));
        id
    }

    pub fn detach_output(&mut self, id: OutputId) -> bool {
        let before = self.outputs.len();
        self.outputs.retain(|(output_id, _)| *output_id != id);
        self.outputs.len() != before
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    pub fn output_labels(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(|(_, label)| label.as_str())
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;

    #[test]
    fn listeners_receive_resizes_until_removed() {
        let mut stage = Stage::new(640, 480);
        let calls = Rc::new(Cell::new(0));

        let calls_clone = calls.clone();
        let id = stage.add_resize_listener(Box::new(move |_, _| {
            calls_clone.set(calls_clone.get() + 1)
        }));
        assert_eq!(stage.resize_listener_count(), 1);

        stage.resize(800, 600);
        assert_eq!(calls.get(), 1);
        assert_eq!(stage.size(), (800, 600));

        assert!(stage.remove_resize_listener(id));
        assert!(!stage.remove_resize_listener(id));
        stage.resize(1024, 768);
        assert_eq!(calls.get(), 1);
        assert_eq!(stage.resize_listener_count(), 0);
    }

    #[test]
    fn outputs_attach_and_detach() {
        let mut stage = Stage::new(1, 1);
        let a = stage.attach_output("a");
        let b = stage.attach_output("b");
        assert_ne!(a, b);
        assert_eq!(stage.output_count(), 2);

        assert!(stage.detach_output(a));
        assert_eq!(stage.output_labels().collect::<Vec<_>>(), vec!["b"]);
    }
}

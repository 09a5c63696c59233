use crate::dom::{Dom, Event, EventKind, ListenerId};
use std::cell::RefCell;
use std::rc::Rc;

/// Sends focus from the last focusable element of an open container back to
/// the first one when the last loses focus.
///
/// Each container keeps at most one armed listener; arming it again drops the
/// previous one. Loops of other containers are left alone.
pub struct FocusLoop<D: Dom> {
    dom: D,
    armed: RefCell<Vec<Armed<D::Node>>>,
}

struct Armed<N> {
    container: N,
    last: N,
    id: ListenerId,
}

impl<D: Dom> FocusLoop<D> {
    #[must_use]
    pub fn new(dom: &D) -> Self {
        Self {
            dom: dom.clone(),
            armed: RefCell::new(Vec::new()),
        }
    }

    pub fn arm(&self, container: &D::Node, focusable: &[D::Node]) {
        self.disarm(container);
        let (Some(first), Some(last)) = (focusable.first(), focusable.last()) else {
            return;
        };
        let dom = self.dom.clone();
        let first = first.clone();
        let id = self.dom.add_listener(
            last,
            EventKind::Blur,
            Rc::new(move |_: &Event<D::Node>| dom.focus(&first)),
        );
        self.armed.borrow_mut().push(Armed {
            container: container.clone(),
            last: last.clone(),
            id,
        });
    }

    pub fn disarm(&self, container: &D::Node) {
        self.armed.borrow_mut().retain(|armed| {
            if &armed.container != container {
                return true;
            }
            self.dom.remove_listener(&armed.last, armed.id);
            false
        });
    }

    #[must_use]
    pub fn is_armed(&self, container: &D::Node) -> bool {
        self.armed
            .borrow()
            .iter()
            .any(|a| &a.container == container)
    }
}

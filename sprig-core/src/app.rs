//! Application entry point.

use std::rc::Rc;

use tracing::debug;

use crate::component::{ComponentInstance, ComponentOptions};
use crate::host::{Host, HostNode};
use crate::renderer::Renderer;
use crate::vnode::{h, Props};

/// A root component waiting to be mounted.
#[derive(Debug, Clone)]
pub struct App {
    root: Rc<ComponentOptions>,
    props: Option<Props>,
}

/// Create an application around a root component.
pub fn create_app(root: Rc<ComponentOptions>) -> App {
    App { root, props: None }
}

impl App {
    /// Props passed to the root component.
    pub fn with_props(mut self, props: Props) -> Self {
        self.props = Some(props);
        self
    }

    /// Render the root component into `container` and return its instance.
    pub fn mount<H: Host + 'static>(
        &self,
        renderer: &Renderer<H>,
        container: HostNode,
    ) -> Option<Rc<ComponentInstance>> {
        debug!(target: "sprig::app", root = self.root.name(), %container, "mounting app");

        renderer.render(h(&self.root, self.props.clone(), ()), container);
        renderer
            .root(container)
            .and_then(|vnode| vnode.component)
            .and_then(|id| renderer.instance(id))
    }
}

mod resolve_file_resources;
mod web_accessible_resources;

pub use self::{
  resolve_file_resources::FileResourceResolver,
  web_accessible_resources::{
    dev_web_accessible_resources, merge_web_accessible_resources,
    render_web_accessible_resources, RenderedResources, ResourceRoot,
    WebAccessibleResourcesPlugin,
  },
};

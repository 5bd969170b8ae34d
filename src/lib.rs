#![doc(html_root_url = "https://docs.rs/vdom-reconcile/0.1.0")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! A keyed virtual DOM reconciler.
//!
//! Build a tree of [`VNode`]s with [`h`] or [`create_node`], hand it to a [`Differ`] to [`render`](`Differ::render`) it
//! onto a [`Surface`], and later [`patch`](`Differ::patch`) it into the next tree.
//!
//! Two surfaces are included: [`memory::MemoryDom`], which records every mutation, and [`web::WebSurface`] for the browser.

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod attributes;
mod component;
mod diff;
mod differ;
mod error;
pub mod event;
pub mod form;
mod lis;
pub mod memory;
mod mount;
mod props;
mod queue;
mod ref_counts;
mod surface;
mod unmount;
mod vnode;
pub mod web;

pub use component::{instance, Component, ComponentClass, ComponentRef, Context, Destroyable, FunctionComponent, Mountable, Updatable};
pub use differ::Differ;
pub use error::Error;
pub use event::{Event, EventHandler};
pub use props::{Key, PropValue, Props, RefCallback};
pub use queue::MountQueue;
pub use surface::{Handle, Surface, SVG_NAMESPACE};
pub use vnode::{create_node, h, normalize_children, Children, ElementKind, Kind, Tag, VNode};

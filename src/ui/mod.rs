/// Yew front ends: the browser-action popup and the sessions page
pub mod components;
pub mod popup;
pub mod sessions;

//! Host environment contract and the preflight checks run before any sign-in mutation.
//!
//! The client never touches a window object directly. A [`Host`] reports the facts the
//! preflight needs (browser or not, embedded or top-level, popup lineage), exposes the
//! current page URL, and performs the navigation. [`StaticHost`] is a fixed-value
//! implementation for tests, demos, and non-browser shells.

// self
use crate::{_prelude::*, error::EnvironmentError};

/// Browser-like environment consumed by the redirect flow.
pub trait Host
where
	Self: Send + Sync,
{
	/// Returns true when running inside a browser-like environment.
	fn is_browser(&self) -> bool;

	/// Returns true when the current frame is embedded in another document.
	fn is_embedded(&self) -> bool;

	/// Returns true when the window has an opener distinct from itself.
	fn has_opener(&self) -> bool;

	/// Name assigned to the current window, if any.
	fn window_name(&self) -> Option<String>;

	/// URL of the currently loaded page.
	fn current_url(&self) -> Url;

	/// Navigates the top-level window. The script context may not survive the call.
	fn navigate(&self, url: &Url) -> Result<(), EnvironmentError>;
}

/// Runs the environment checks in order; the first failure wins.
pub fn preflight(host: &dyn Host, popup_name_prefix: &str) -> Result<(), EnvironmentError> {
	if !host.is_browser() {
		return Err(EnvironmentError::NotBrowser);
	}
	if host.is_embedded() {
		return Err(EnvironmentError::EmbeddedFrame);
	}
	if let Some(window_name) = library_popup_name(host, popup_name_prefix) {
		return Err(EnvironmentError::LibraryPopup { window_name });
	}

	Ok(())
}

fn library_popup_name(host: &dyn Host, popup_name_prefix: &str) -> Option<String> {
	if !host.has_opener() {
		return None;
	}

	let name = host.window_name()?;

	name.strip_prefix(popup_name_prefix)
		.is_some_and(|rest| rest.starts_with('.'))
		.then_some(name)
}

/// Host with fixed environment facts that records navigations instead of performing them.
#[derive(Debug)]
pub struct StaticHost {
	/// Reported browser flag.
	pub browser: bool,
	/// Reported embedding flag.
	pub embedded: bool,
	/// Reported opener flag.
	pub opener: bool,
	/// Reported window name.
	pub name: Option<String>,
	current: RwLock<Url>,
	navigations: Mutex<Vec<Url>>,
}
impl StaticHost {
	/// Top-level browser window sitting on `current_url`.
	pub fn browser(current_url: Url) -> Self {
		Self {
			browser: true,
			embedded: false,
			opener: false,
			name: None,
			current: RwLock::new(current_url),
			navigations: Mutex::new(Vec::new()),
		}
	}

	/// Environment without a window, e.g. a server process.
	pub fn headless(current_url: Url) -> Self {
		Self { browser: false, ..Self::browser(current_url) }
	}

	/// Marks the window as embedded in another document.
	pub fn embedded(mut self) -> Self {
		self.embedded = true;

		self
	}

	/// Marks the window as a popup with the provided name.
	pub fn popup(mut self, name: impl Into<String>) -> Self {
		self.opener = true;
		self.name = Some(name.into());

		self
	}

	/// Simulates the browser landing on `url`, e.g. the provider redirecting back.
	pub fn land_on(&self, url: Url) {
		*self.current.write() = url;
	}

	/// URLs passed to [`Host::navigate`], oldest first.
	pub fn navigations(&self) -> Vec<Url> {
		self.navigations.lock().clone()
	}
}
impl Host for StaticHost {
	fn is_browser(&self) -> bool {
		self.browser
	}

	fn is_embedded(&self) -> bool {
		self.embedded
	}

	fn has_opener(&self) -> bool {
		self.opener
	}

	fn window_name(&self) -> Option<String> {
		self.name.clone()
	}

	fn current_url(&self) -> Url {
		self.current.read().clone()
	}

	fn navigate(&self, url: &Url) -> Result<(), EnvironmentError> {
		if !self.browser {
			return Err(EnvironmentError::NavigationFailed { reason: "no window".into() });
		}

		self.navigations.lock().push(url.clone());

		Ok(())
	}
}

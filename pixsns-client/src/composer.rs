use crate::{
    api::{CommentId, PostId},
    html, OptimizedImage,
};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ComposeTarget {
    Reply(CommentId),
    Edit(CommentId),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    Idle,
    Composing,
    Submitting,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StagedImage {
    /// Optimized locally, not uploaded yet
    Pending(OptimizedImage),

    /// Already in the object store
    Uploaded(String),
}

/// Everything needed to send one composition
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Submission {
    pub post: PostId,
    pub target: Option<ComposeTarget>,
    pub content: String,
    pub image: Option<StagedImage>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Composer {
    content: String,
    image: Option<StagedImage>,
    phase: Phase,
}

impl Default for Composer {
    fn default() -> Composer {
        Composer {
            content: String::new(),
            image: None,
            phase: Phase::Idle,
        }
    }
}

impl Composer {
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn image(&self) -> Option<&StagedImage> {
        self.image.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_empty(&self) -> bool {
        html::is_blank(&self.content)
    }

    pub fn is_submitting(&self) -> bool {
        self.phase == Phase::Submitting
    }

    /// Whether a submit action would be accepted right now
    pub fn can_submit(&self) -> bool {
        !self.is_submitting() && !self.is_empty()
    }

    pub(crate) fn touch(&mut self) {
        if self.phase == Phase::Idle {
            self.phase = Phase::Composing;
        }
    }

    pub(crate) fn set_content(&mut self, content: String) {
        self.content = content;
        self.touch();
    }

    pub(crate) fn set_text(&mut self, text: &str) {
        self.content = html::apply_text_edit(&self.content, text);
        self.touch();
    }

    pub(crate) fn seed(&mut self, content: String, image_url: Option<String>) {
        self.content = content;
        self.image = image_url.map(StagedImage::Uploaded);
        self.phase = Phase::Composing;
    }

    pub(crate) fn stage_image(&mut self, image: OptimizedImage) {
        self.image = Some(StagedImage::Pending(image));
        self.touch();
    }

    pub(crate) fn remove_image(&mut self) {
        self.image = None;
    }

    /// Records that the pending image reached the object store, so a retry
    /// after a failed submission does not upload it twice
    pub(crate) fn image_uploaded(&mut self, url: String) {
        if matches!(self.image, Some(StagedImage::Pending(_))) {
            self.image = Some(StagedImage::Uploaded(url));
        }
    }

    pub(crate) fn begin_submit(&mut self) -> Result<(String, Option<StagedImage>), crate::Error> {
        if self.is_submitting() {
            return Err(crate::Error::Busy);
        }
        if self.is_empty() {
            return Err(crate::Error::EmptyComposer);
        }
        self.phase = Phase::Submitting;
        Ok((self.content.clone(), self.image.clone()))
    }

    pub(crate) fn submit_succeeded(&mut self) {
        *self = Composer::default();
    }

    pub(crate) fn submit_failed(&mut self) {
        self.phase = Phase::Composing;
    }

    pub(crate) fn clear(&mut self) {
        *self = Composer::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guards_empty_and_in_flight() {
        let mut c = Composer::default();
        assert!(matches!(c.begin_submit(), Err(crate::Error::EmptyComposer)));
        assert_eq!(c.phase(), Phase::Idle);

        c.set_content(String::from("<p>hi</p>"));
        assert_eq!(c.phase(), Phase::Composing);
        let (content, image) = c.begin_submit().expect("first submit");
        assert_eq!(content, "<p>hi</p>");
        assert_eq!(image, None);
        assert!(matches!(c.begin_submit(), Err(crate::Error::Busy)));

        c.submit_failed();
        assert_eq!(c.content(), "<p>hi</p>");
        assert!(c.can_submit());

        c.begin_submit().expect("retry");
        c.submit_succeeded();
        assert_eq!(c, Composer::default());
    }

    #[test]
    fn upload_is_remembered() {
        let mut c = Composer::default();
        c.stage_image(OptimizedImage {
            file_name: String::from("a.jpg"),
            mime: "image/jpeg",
            bytes: vec![1, 2, 3],
            width: 1,
            height: 1,
        });
        c.image_uploaded(String::from("https://store/a.jpg"));
        assert_eq!(
            c.image(),
            Some(&StagedImage::Uploaded(String::from("https://store/a.jpg")))
        );
        c.remove_image();
        assert_eq!(c.image(), None);
    }
}

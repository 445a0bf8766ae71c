use crate::models::LabelSet;

/// Build the instruction sent alongside every image.
///
/// The model is asked for `yes`/`no` on the first line and, for clothing, a
/// second line holding an array of two or three labels from `labels`.
pub fn build_classification_prompt(labels: &LabelSet) -> String {
    format!(
        "Recognize the image and classify it based on the following labels:\n\
         {labels}\n\
         \n\
         Only return:\n\
         1. Whether it's a clothing item (\"yes\" or \"no\") in the first line in lowercase\n\
         2. If it's a clothing item, in the next line return an array with the appropriate labels it matches (from the list provided above)\n\
         If it's not a clothing item, just return \"no\" and no second line, only if it's a yes, we get a second line\n\
         \n\
         Further instructions:\n\
         - Only return major labels, you don't have to cross check each label\n\
         - Label count should be as low as possible, minimum is 2, maximum is 3\n",
        labels = labels.joined()
    )
}

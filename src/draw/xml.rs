use std::fmt;

#[macro_export]
macro_rules! xml_format_args {
    // ends a tag
    (@inner(> $($attrs:tt)*) -> ($($pattern:expr),*), ($($args:expr),*)) => {
        $crate::xml_format_args!(@outer($($attrs)*) -> ($($pattern),*, ">"), ($($args),*))
    };
    // ends a self-closing element
    (@inner(/> $($attrs:tt)*) -> ($($pattern:expr),*), ($($args:expr),*)) => {
        $crate::xml_format_args!(@outer($($attrs)*) -> ($($pattern),*, " />"), ($($args),*))
    };
    // matches an attribute with a singly-hyphenated name
    (@inner($aname1:ident-$aname2:ident $($attrs:tt)*) -> ($($pattern:expr),*), ($($args:expr),*)) => {
        $crate::xml_format_args!(@attr($($attrs)*) -> ($($pattern),*, " ", stringify!($aname1), "-", stringify!($aname2)), ($($args),*))
    };
    // matches an attribute which fits in a rust identifier
    (@inner($aname:ident $($attrs:tt)*) -> ($($pattern:expr),*), ($($args:expr),*)) => {
        $crate::xml_format_args!(@attr($($attrs)*) -> ($($pattern),*, " ", stringify!($aname)), ($($args),*))
    };

    // an expression, evaluating to an iterable as a space-separated attribute value
    (@attr(=[$avalue:expr] $($attrs:tt)*) -> ($($pattern:expr),*), ($($args:expr),*)) => {
        $crate::xml_format_args!(@inner($($attrs)*) -> ($($pattern),*, "=\"{}\""), ($($args,)* $crate::draw::xml::Escaped($crate::draw::xml::JoinList { list: $avalue, join: " " })))
    };
    // an expression as an attribute value
    (@attr(={$avalue:expr} $($attrs:tt)*) -> ($($pattern:expr),*), ($($args:expr),*)) => {
        $crate::xml_format_args!(@inner($($attrs)*) -> ($($pattern),*, "=\"{}\""), ($($args,)* $crate::draw::xml::Escaped($avalue)))
    };
    // a literal as an attribute value
    (@attr(=$avalue:literal $($attrs:tt)*) -> ($($pattern:expr),*), ($($args:expr),*)) => {
        $crate::xml_format_args!(@inner($($attrs)*) -> ($($pattern),*, "=\"", $avalue, "\""), ($($args),*))
    };

    // starts a tag
    (@outer(<$name:ident $($attrs:tt)*) -> ($($pattern:expr),*), ($($args:expr),*)) => {
        $crate::xml_format_args!(@inner($($attrs)*) -> ($($pattern),*, "<", stringify!($name)), ($($args),*))
    };
    // matches an end tag
    (@outer(</$name:ident> $($attrs:tt)*) -> ($($pattern:expr),*), ($($args:expr),*)) => {
        $crate::xml_format_args!(@outer($($attrs)*) -> ($($pattern),*, "</", stringify!($name), ">"), ($($args),*))
    };
    // matches a text expression, which is escaped
    (@outer({$text:expr} $($attrs:tt)*) -> ($($pattern:expr),*), ($($args:expr),*)) => {
        $crate::xml_format_args!(@outer($($attrs)*) -> ($($pattern),*, "{}"), ($($args,)* $crate::draw::xml::Escaped($text)))
    };
    // matches a text literal, written as is
    (@outer($text:literal $($attrs:tt)*) -> ($($pattern:expr),*), ($($args:expr),*)) => {
        $crate::xml_format_args!(@outer($($attrs)*) -> ($($pattern),*, $text), ($($args),*))
    };
    // matches the end of the xml
    (@outer() -> ($($pattern:expr),*), ($($args:expr),*)) => {
        format_args!(concat!($($pattern),*, "\n"), $($args),*)
    };

    // matches the start of a tag, for opening the xml
    (<$($attrs:tt)*) => {
        $crate::xml_format_args!(@outer(<$($attrs)*) -> (""), ())
    };
}

/// Write XML to an `io::Write`, expressions in braces are escaped
#[macro_export]
macro_rules! write_xml {
    ($dst:expr, $($attrs:tt)*) => {
        $dst.write_fmt($crate::xml_format_args!($($attrs)*))
    }
}

/// Format xml elements and their attributes as a `String`
#[macro_export]
macro_rules! format_xml {
    ($($attrs:tt)*) => {{
        let mut s = String::new();
        std::fmt::Write::write_fmt(&mut s, $crate::xml_format_args!($($attrs)*)).unwrap();
        s
    }}
}

pub struct JoinList<D, I>
where
    D: fmt::Display,
    I: IntoIterator<Item = D> + Copy,
{
    pub list: I,
    pub join: &'static str,
}

impl<D, I> fmt::Display for JoinList<D, I>
where
    D: fmt::Display,
    I: IntoIterator<Item = D> + Copy,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut iter = self.list.into_iter();
        if let Some(i) = iter.next() {
            i.fmt(f)?;
        }
        for i in iter {
            f.write_str(self.join)?;
            i.fmt(f)?;
        }
        Ok(())
    }
}

/// Displays the inner value with XML special characters replaced by entities
pub struct Escaped<T>(pub T);

impl<T: fmt::Display> fmt::Display for Escaped<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use fmt::Write;
        let mut escaping = EscapingWriter { inner: f };
        write!(escaping, "{}", self.0)
    }
}

struct EscapingWriter<'a, 'b> {
    inner: &'a mut fmt::Formatter<'b>,
}

impl fmt::Write for EscapingWriter<'_, '_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let mut written = 0;
        for (i, c) in s.char_indices() {
            let entity = match c {
                '&' => "&amp;",
                '<' => "&lt;",
                '>' => "&gt;",
                '"' => "&quot;",
                '\'' => "&#39;",
                _ => continue,
            };
            self.inner.write_str(&s[written..i])?;
            self.inner.write_str(entity)?;
            written = i + c.len_utf8();
        }
        self.inner.write_str(&s[written..])
    }
}

#[test]
fn self_closing() {
    assert_eq!(format_xml!(<circle />), "<circle />\n");
}

#[test]
fn self_closing_attributes() {
    assert_eq!(
        format_xml!(<circle cx={1.5} cy={"2"} />),
        "<circle cx=\"1.5\" cy=\"2\" />\n"
    );
}

#[test]
fn literal_attribute() {
    assert_eq!(format_xml!(<g class="stations" />), "<g class=\"stations\" />\n");
}

#[test]
fn hyphenated_attribute() {
    assert_eq!(
        format_xml!(<circle data-station={"A32000"} stroke-width="1" />),
        "<circle data-station=\"A32000\" stroke-width=\"1\" />\n"
    );
}

#[test]
fn space_separated_attribute() {
    let list = &["station", "busy"];
    assert_eq!(
        format_xml!(<circle class=[list] />),
        "<circle class=\"station busy\" />\n"
    );
}

#[test]
fn text_containing() {
    assert_eq!(format_xml!(<title>{"12 trips"}</title>), "<title>12 trips</title>\n");
    assert_eq!(format_xml!(<text>"(any time)"</text>), "<text>(any time)</text>\n");
}

#[test]
fn element_containing() {
    assert_eq!(
        format_xml!(<circle r="3"><title>{4}</title></circle>),
        "<circle r=\"3\"><title>4</title></circle>\n"
    );
}

#[test]
fn escapes_expressions() {
    assert_eq!(
        format_xml!(<title>{"Mass Ave & Beacon <St>"}</title>),
        "<title>Mass Ave &amp; Beacon &lt;St&gt;</title>\n"
    );
    assert_eq!(
        format_xml!(<circle data-name={"O'Brien \"Hwy\""} />),
        "<circle data-name=\"O&#39;Brien &quot;Hwy&quot;\" />\n"
    );
    assert_eq!(Escaped("café ünïcode").to_string(), "café ünïcode");
}
